//! Comment threads and engagement ranking
//!
//! Threads are assembled from a flat, id-indexed arena of comments. Reply
//! links are followed from the parent's `reply_ids` and only when the child
//! points back at the same parent, so a dangling id or an orphaned reply is
//! silently left out of the view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{AuthorProfile, Comment, NewComment, ReactionSet};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::repository::{CommentStore, UserDirectory};

/// Reply levels materialized below a top-level comment
pub const MAX_REPLY_DEPTH: usize = 2;
pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const DEFAULT_NEWEST_LIMIT: usize = 10;
pub const MAX_LIST_LIMIT: usize = 100;

/// Comment as presented to clients; authors carry display fields only
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: Uuid,
    pub content_id: String,
    pub content_name: String,
    pub content_thumb: Option<String>,
    pub body: String,
    pub is_spoiler: bool,
    pub parent_id: Option<Uuid>,
    pub reply_count: usize,
    #[serde(flatten)]
    pub reactions: ReactionSet,
    pub author: AuthorProfile,
    pub replies: Vec<CommentNode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentNode {
    fn leaf(comment: &Comment, author: AuthorProfile) -> Self {
        Self {
            id: comment.id,
            content_id: comment.content_id.clone(),
            content_name: comment.content_name.clone(),
            content_thumb: comment.content_thumb.clone(),
            body: comment.body.clone(),
            is_spoiler: comment.is_spoiler,
            parent_id: comment.parent_id,
            reply_count: comment.reply_ids.len(),
            reactions: comment.reactions.clone(),
            author,
            replies: Vec::new(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedComment {
    #[serde(flatten)]
    pub comment: CommentNode,
    pub engagement_score: u64,
}

/// Flat id-indexed comment storage used for bounded traversal
#[derive(Debug, Default)]
pub struct CommentArena {
    nodes: HashMap<Uuid, Comment>,
}

impl CommentArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, comments: impl IntoIterator<Item = Comment>) {
        for comment in comments {
            self.nodes.insert(comment.id, comment);
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&Comment> {
        self.nodes.get(id)
    }

    /// Replies of `parent` in insertion order, skipping asymmetric links
    pub fn replies_of<'a>(&'a self, parent: &'a Comment) -> impl Iterator<Item = &'a Comment> + 'a {
        parent
            .reply_ids
            .iter()
            .filter_map(move |id| self.nodes.get(id))
            .filter(move |child| child.parent_id == Some(parent.id))
    }

    pub fn author_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.nodes.values().map(|c| c.user_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Build the view of `root` with at most `max_depth` reply levels
    pub fn assemble(
        &self,
        root: &Comment,
        max_depth: usize,
        authors: &HashMap<Uuid, AuthorProfile>,
    ) -> CommentNode {
        self.assemble_at(root, 0, max_depth, authors)
    }

    fn assemble_at(
        &self,
        comment: &Comment,
        depth: usize,
        max_depth: usize,
        authors: &HashMap<Uuid, AuthorProfile>,
    ) -> CommentNode {
        let mut node = CommentNode::leaf(comment, author_of(comment, authors));
        if depth < max_depth {
            node.replies = self
                .replies_of(comment)
                .map(|child| self.assemble_at(child, depth + 1, max_depth, authors))
                .collect();
        }
        node
    }
}

fn author_of(comment: &Comment, authors: &HashMap<Uuid, AuthorProfile>) -> AuthorProfile {
    authors
        .get(&comment.user_id)
        .cloned()
        .unwrap_or_else(|| AuthorProfile::unknown(comment.user_id))
}

/// Top `limit` comments by likes plus direct replies, ties to the earlier one
pub fn rank_by_engagement(comments: &[Comment], limit: usize) -> Vec<&Comment> {
    let mut ranked: Vec<&Comment> = comments.iter().collect();
    ranked.sort_by(|a, b| {
        b.engagement_score()
            .cmp(&a.engagement_score())
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Clone)]
pub struct ThreadAssembler {
    users: Arc<dyn UserDirectory>,
    comments: Arc<dyn CommentStore>,
}

impl ThreadAssembler {
    pub fn new(users: Arc<dyn UserDirectory>, comments: Arc<dyn CommentStore>) -> Self {
        Self { users, comments }
    }

    pub async fn create_comment(&self, caller: Uuid, input: NewComment) -> Result<CommentNode> {
        if input.body.trim().is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }
        if input.content_id.trim().is_empty() || input.content_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Content id and content name are required".to_string(),
            ));
        }

        let author = self
            .users
            .profile(caller)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .comments
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
            if parent.content_id != input.content_id {
                return Err(AppError::Validation(
                    "Reply must belong to the same content as its parent".to_string(),
                ));
            }
        }

        let comment = Comment::new(caller, input);
        self.comments.insert_comment(&comment).await?;

        metrics::record_comment(comment.parent_id.is_some());
        info!(
            comment_id = %comment.id,
            user_id = %caller,
            content_id = %comment.content_id,
            is_reply = comment.parent_id.is_some(),
            "Comment created"
        );

        Ok(CommentNode::leaf(&comment, author))
    }

    /// Top-level comments of a content item with their reply trees
    pub async fn list_top_level(&self, content_id: &str) -> Result<Vec<CommentNode>> {
        let top = self.comments.top_level_for_content(content_id).await?;
        let mut arena = CommentArena::new();

        let mut frontier: Vec<Uuid> = top.iter().map(|c| c.id).collect();
        for _ in 0..MAX_REPLY_DEPTH {
            if frontier.is_empty() {
                break;
            }
            let children = self.comments.children_of(&frontier).await?;
            frontier = children.iter().map(|c| c.id).collect();
            arena.extend(children);
        }
        arena.extend(top.iter().cloned());

        let authors = self.users.profiles(&arena.author_ids()).await?;
        let threads: Vec<CommentNode> = top
            .iter()
            .map(|root| arena.assemble(root, MAX_REPLY_DEPTH, &authors))
            .collect();

        debug!(content_id, threads = threads.len(), "Assembled comment threads");
        Ok(threads)
    }

    pub async fn rank_by_engagement(&self, limit: Option<usize>) -> Result<Vec<RankedComment>> {
        let limit = clamp_limit(limit, DEFAULT_TOP_LIMIT);
        let candidates = self.comments.ranking_candidates(limit).await?;
        let ranked = rank_by_engagement(&candidates, limit);

        let author_ids: Vec<Uuid> = ranked.iter().map(|c| c.user_id).collect();
        let authors = self.users.profiles(&author_ids).await?;

        Ok(ranked
            .into_iter()
            .map(|c| RankedComment {
                engagement_score: c.engagement_score(),
                comment: CommentNode::leaf(c, author_of(c, &authors)),
            })
            .collect())
    }

    pub async fn newest(&self, limit: Option<usize>) -> Result<Vec<CommentNode>> {
        let limit = clamp_limit(limit, DEFAULT_NEWEST_LIMIT);
        let comments = self.comments.newest(limit).await?;

        let author_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
        let authors = self.users.profiles(&author_ids).await?;

        Ok(comments
            .iter()
            .map(|c| CommentNode::leaf(c, author_of(c, &authors)))
            .collect())
    }
}

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment_at(minutes: i64, likes: usize, replies: usize) -> Comment {
        let mut comment = Comment::new(
            Uuid::new_v4(),
            NewComment {
                content_id: "movie".to_string(),
                content_name: "Movie".to_string(),
                content_thumb: None,
                body: "text".to_string(),
                is_spoiler: Some(false),
                parent_id: None,
            },
        );
        comment.created_at = DateTime::from_timestamp(0, 0).unwrap() + Duration::minutes(minutes);
        for _ in 0..likes {
            comment.reactions.apply(Uuid::new_v4(), crate::domain::Reaction::Like);
        }
        comment.reply_ids = (0..replies).map(|_| Uuid::new_v4()).collect();
        comment
    }

    #[test]
    fn test_rank_ties_favor_earlier_comment() {
        let comments = vec![comment_at(0, 5, 2), comment_at(1, 3, 1), comment_at(2, 5, 2)];

        let ranked = rank_by_engagement(&comments, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, comments[0].id);
        assert_eq!(ranked[1].id, comments[2].id);
        assert!(ranked.iter().all(|c| c.engagement_score() == 7));
    }

    #[test]
    fn test_rank_limit_larger_than_input() {
        let comments = vec![comment_at(0, 1, 0)];
        assert_eq!(rank_by_engagement(&comments, 10).len(), 1);
        assert!(rank_by_engagement(&[], 10).is_empty());
    }

    #[test]
    fn test_arena_stops_at_max_depth() {
        let mut chain = vec![comment_at(0, 0, 0)];
        for i in 1..4 {
            let mut reply = comment_at(i, 0, 0);
            reply.parent_id = Some(chain[i as usize - 1].id);
            let reply_id = reply.id;
            chain[i as usize - 1].reply_ids = vec![reply_id];
            chain.push(reply);
        }

        let mut arena = CommentArena::new();
        arena.extend(chain.iter().cloned());
        let view = arena.assemble(&chain[0], MAX_REPLY_DEPTH, &HashMap::new());

        assert_eq!(view.replies.len(), 1);
        assert_eq!(view.replies[0].replies.len(), 1);
        assert!(view.replies[0].replies[0].replies.is_empty());
        assert_eq!(view.replies[0].replies[0].reply_count, 1);
    }

    #[test]
    fn test_arena_skips_asymmetric_links() {
        let mut root = comment_at(0, 0, 0);
        let mut stranger = comment_at(1, 0, 0);
        stranger.parent_id = Some(Uuid::new_v4());
        root.reply_ids = vec![stranger.id, Uuid::new_v4()];

        let mut arena = CommentArena::new();
        arena.extend([root.clone(), stranger]);
        let view = arena.assemble(&root, MAX_REPLY_DEPTH, &HashMap::new());

        assert!(view.replies.is_empty());
        assert_eq!(view.author.username, "unknown");
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 10), 10);
        assert_eq!(clamp_limit(Some(0), 10), 1);
        assert_eq!(clamp_limit(Some(1000), 10), MAX_LIST_LIMIT);
    }
}
