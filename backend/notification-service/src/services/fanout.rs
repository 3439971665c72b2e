//! Fan-out of administrative events
//!
//! `Created -> Persisted -> {PushAttempted, EmailAttempted} -> Done`
//!
//! The mailbox append is the system of record. Once at least one mailbox
//! holds the record the event is never rolled back; push and email are
//! best-effort and their failures are only logged and counted.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::email::Mailer;
use super::mailbox::MailboxService;
use super::push::Broadcaster;
use super::templates;
use crate::error::Result;
use crate::metrics;
use crate::models::{AdminAccount, NotificationRecord, UserAccount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutStage {
    Created,
    Persisted,
    PushAttempted,
    EmailAttempted,
    Done,
    Aborted,
}

impl FanoutStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanoutStage::Created => "created",
            FanoutStage::Persisted => "persisted",
            FanoutStage::PushAttempted => "push_attempted",
            FanoutStage::EmailAttempted => "email_attempted",
            FanoutStage::Done => "done",
            FanoutStage::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    pub notification_id: Uuid,
    /// Final stage reached
    pub stage: FanoutStage,
    /// Every stage passed through, in order
    pub trail: Vec<FanoutStage>,
    pub mailboxes_updated: usize,
    pub mailboxes_failed: usize,
    pub push_attempted: bool,
    pub push_succeeded: bool,
    pub emails_sent: usize,
    pub emails_failed: usize,
    /// Persistence error that aborted the fan-out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FanoutReport {
    fn new(notification_id: Uuid) -> Self {
        Self {
            notification_id,
            stage: FanoutStage::Created,
            trail: vec![FanoutStage::Created],
            mailboxes_updated: 0,
            mailboxes_failed: 0,
            push_attempted: false,
            push_succeeded: false,
            emails_sent: 0,
            emails_failed: 0,
            error: None,
        }
    }

    fn advance(&mut self, stage: FanoutStage) {
        self.stage = stage;
        self.trail.push(stage);
    }

    pub fn is_aborted(&self) -> bool {
        self.stage == FanoutStage::Aborted
    }
}

#[derive(Clone)]
pub struct FanoutDispatcher {
    mailbox: MailboxService,
    broadcaster: Arc<dyn Broadcaster>,
    mailer: Arc<dyn Mailer>,
    email_concurrency: usize,
}

impl FanoutDispatcher {
    pub fn new(
        mailbox: MailboxService,
        broadcaster: Arc<dyn Broadcaster>,
        mailer: Arc<dyn Mailer>,
        email_concurrency: usize,
    ) -> Self {
        Self {
            mailbox,
            broadcaster,
            mailer,
            email_concurrency: email_concurrency.max(1),
        }
    }

    /// Deliver `record` about a change to `subject` to every admin
    ///
    /// Errors only when the admin list itself cannot be loaded; everything
    /// after that is reported through [`FanoutReport`].
    pub async fn dispatch(
        &self,
        record: &NotificationRecord,
        subject: &UserAccount,
    ) -> Result<FanoutReport> {
        let mut report = FanoutReport::new(record.id);
        let kind = record.kind.as_str();

        let admins = self.mailbox.list_admins().await?;

        let outcome = self.mailbox.append_to(&admins, record).await;
        report.mailboxes_updated = outcome.updated;
        report.mailboxes_failed = outcome.failed;
        if outcome.updated == 0 && outcome.failed > 0 {
            report.advance(FanoutStage::Aborted);
            report.error = outcome.first_error;
            warn!(
                notification_id = %record.id,
                failed = outcome.failed,
                "fan-out aborted: no admin mailbox could be updated"
            );
            metrics::record_fanout(kind, report.stage.as_str());
            return Ok(report);
        }
        report.advance(FanoutStage::Persisted);

        let push_targets = admins.iter().any(|a| a.effective_preferences().push);
        let email_targets: Vec<&AdminAccount> = admins
            .iter()
            .filter(|a| a.effective_preferences().email)
            .collect();

        let (push, (sent, failed)) = futures::join!(
            self.push(record, push_targets),
            self.send_emails(record, subject, &email_targets)
        );

        if let Some(ok) = push {
            report.push_attempted = true;
            report.push_succeeded = ok;
            report.advance(FanoutStage::PushAttempted);
        }
        if !email_targets.is_empty() {
            report.advance(FanoutStage::EmailAttempted);
        }
        report.emails_sent = sent;
        report.emails_failed = failed;
        report.advance(FanoutStage::Done);

        info!(
            notification_id = %record.id,
            kind,
            mailboxes = report.mailboxes_updated,
            mailbox_failures = report.mailboxes_failed,
            push = report.push_attempted,
            emails_sent = report.emails_sent,
            emails_failed = report.emails_failed,
            "fan-out complete"
        );
        metrics::record_fanout(kind, report.stage.as_str());
        Ok(report)
    }

    /// One broadcast when any admin wants push; `None` when skipped
    async fn push(&self, record: &NotificationRecord, any_eligible: bool) -> Option<bool> {
        if !any_eligible {
            return None;
        }

        let payload = match serde_json::to_value(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(notification_id = %record.id, error = %e, "failed to encode push payload");
                metrics::record_delivery("push", false);
                return Some(false);
            }
        };

        match self
            .broadcaster
            .broadcast(record.kind.event_name(), payload)
            .await
        {
            Ok(_) => {
                metrics::record_delivery("push", true);
                Some(true)
            }
            Err(e) => {
                warn!(notification_id = %record.id, error = %e, "push broadcast failed");
                metrics::record_delivery("push", false);
                Some(false)
            }
        }
    }

    /// Returns (sent, failed)
    async fn send_emails(
        &self,
        record: &NotificationRecord,
        subject: &UserAccount,
        recipients: &[&AdminAccount],
    ) -> (usize, usize) {
        if recipients.is_empty() {
            return (0, 0);
        }

        let at = Utc::now();
        let results: Vec<bool> = stream::iter(recipients.iter().copied())
            .map(|admin| async move {
                let email = templates::render_user_event(record.kind, &admin.username, subject, at);
                match self.mailer.send(&admin.email, &email.subject, &email.html).await {
                    Ok(()) => {
                        metrics::record_delivery("email", true);
                        true
                    }
                    Err(e) => {
                        warn!(
                            admin_id = %admin.id,
                            email = %admin.email,
                            notification_id = %record.id,
                            error = %e,
                            "failed to send admin notification email"
                        );
                        metrics::record_delivery("email", false);
                        false
                    }
                }
            })
            .buffer_unordered(self.email_concurrency)
            .collect()
            .await;

        let sent = results.iter().filter(|ok| **ok).count();
        (sent, results.len() - sent)
    }
}
