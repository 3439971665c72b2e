/// Engagement domain types
pub mod models;
pub mod reaction;

pub use models::*;
pub use reaction::{Reaction, ReactionSet, ReactionSnapshot, ReactionState, ReactionTarget};
