/// Business logic for engagement-service
pub mod ratings;
pub mod reaction_ledger;
pub mod thread_assembler;
pub mod watch_history;

pub use ratings::RatingService;
pub use reaction_ledger::ReactionLedger;
pub use thread_assembler::{CommentArena, CommentNode, RankedComment, ThreadAssembler};
pub use watch_history::WatchHistoryService;

use crate::repository::Stores;

/// Services shared with every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub ledger: ReactionLedger,
    pub threads: ThreadAssembler,
    pub ratings: RatingService,
    pub history: WatchHistoryService,
}

impl AppState {
    pub fn new(stores: Stores) -> Self {
        Self {
            ledger: ReactionLedger::new(stores.users.clone(), stores.reactions.clone()),
            threads: ThreadAssembler::new(stores.users.clone(), stores.comments.clone()),
            ratings: RatingService::new(stores.users.clone(), stores.ratings.clone()),
            history: WatchHistoryService::new(stores.history),
        }
    }
}
