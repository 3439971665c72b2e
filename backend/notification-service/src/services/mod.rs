/// Business logic for notification-service
pub mod email;
pub mod fanout;
pub mod mailbox;
pub mod password;
pub mod push;
pub mod templates;
pub mod user_admin;

pub use email::{Mailer, SmtpMailer};
pub use fanout::{FanoutDispatcher, FanoutReport, FanoutStage};
pub use mailbox::{AppendOutcome, MailboxService};
pub use push::Broadcaster;
pub use user_admin::UserAdminService;

use std::sync::Arc;

use crate::repository::Stores;

/// Services shared with every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub mailbox: MailboxService,
    pub fanout: FanoutDispatcher,
    pub users: UserAdminService,
}

impl AppState {
    pub fn new(
        stores: Stores,
        broadcaster: Arc<dyn Broadcaster>,
        mailer: Arc<dyn Mailer>,
        email_concurrency: usize,
    ) -> Self {
        let mailbox = MailboxService::new(stores.admins);
        let fanout = FanoutDispatcher::new(mailbox.clone(), broadcaster, mailer, email_concurrency);
        Self {
            users: UserAdminService::new(stores.users, fanout.clone()),
            mailbox,
            fanout,
        }
    }
}
