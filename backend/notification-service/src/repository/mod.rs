//! Storage seams for admin accounts and mailboxes

pub mod admin_directory;
pub mod memory;
pub mod users;

pub use admin_directory::{AdminDirectory, PgAdminDirectory};
pub use memory::MemoryDirectory;
pub use users::{PgUserRepository, UserRepository};

use std::sync::Arc;

#[derive(Clone)]
pub struct Stores {
    pub admins: Arc<dyn AdminDirectory>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            admins: Arc::new(PgAdminDirectory::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }

    pub fn memory(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            admins: directory.clone(),
            users: directory,
        }
    }
}
