//! Storage seams for engagement data
//!
//! Each store is an `async_trait` with a PostgreSQL implementation next to
//! it and a shared in-memory implementation in [`memory`].

pub mod comments;
pub mod memory;
pub mod ratings;
pub mod reactions;
pub mod users;
pub mod watch_history;

pub use comments::{CommentStore, PgCommentStore};
pub use memory::MemoryStore;
pub use ratings::{PgRatingStore, RatingStore};
pub use reactions::{PgReactionStore, ReactionStore};
pub use users::{PgUserDirectory, UserDirectory};
pub use watch_history::{PgWatchHistoryStore, WatchHistoryStore};

use std::sync::Arc;

/// Bundle of store handles shared by the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub comments: Arc<dyn CommentStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub reactions: Arc<dyn ReactionStore>,
    pub history: Arc<dyn WatchHistoryStore>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            comments: Arc::new(PgCommentStore::new(pool.clone())),
            ratings: Arc::new(PgRatingStore::new(pool.clone())),
            reactions: Arc::new(PgReactionStore::new(pool.clone())),
            history: Arc::new(PgWatchHistoryStore::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            comments: store.clone(),
            ratings: store.clone(),
            reactions: store.clone(),
            history: store,
        }
    }
}
