use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{AuthorProfile, NewRating, Rating, RatingView};
use crate::error::{AppError, Result};
use crate::repository::{RatingStore, UserDirectory};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

#[derive(Clone)]
pub struct RatingService {
    users: Arc<dyn UserDirectory>,
    ratings: Arc<dyn RatingStore>,
}

impl RatingService {
    pub fn new(users: Arc<dyn UserDirectory>, ratings: Arc<dyn RatingStore>) -> Self {
        Self { users, ratings }
    }

    pub async fn create_rating(&self, caller: Uuid, input: NewRating) -> Result<RatingView> {
        if input.body.trim().is_empty() {
            return Err(AppError::Validation("Rating text is required".to_string()));
        }
        if input.content_id.trim().is_empty() {
            return Err(AppError::Validation("Content id is required".to_string()));
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&input.score) {
            return Err(AppError::Validation(format!(
                "Score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }

        let author = self
            .users
            .profile(caller)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let rating = Rating::new(caller, input);
        self.ratings.insert_rating(&rating).await?;

        info!(
            rating_id = %rating.id,
            user_id = %caller,
            content_id = %rating.content_id,
            score = rating.score,
            "Rating created"
        );

        Ok(RatingView { rating, author })
    }

    pub async fn list_for_content(&self, content_id: &str) -> Result<Vec<RatingView>> {
        let ratings = self.ratings.ratings_for_content(content_id).await?;
        let author_ids: Vec<Uuid> = ratings.iter().map(|r| r.user_id).collect();
        let authors = self.users.profiles(&author_ids).await?;

        Ok(ratings
            .into_iter()
            .map(|rating| {
                let author = authors
                    .get(&rating.user_id)
                    .cloned()
                    .unwrap_or_else(|| AuthorProfile::unknown(rating.user_id));
                RatingView { rating, author }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn service() -> (RatingService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        store.put_profile(AuthorProfile {
            user_id: user,
            username: "critic".to_string(),
            avatar: None,
        });
        (RatingService::new(store.clone(), store), user)
    }

    fn new_rating(score: u8) -> NewRating {
        NewRating {
            content_id: "movie-1".to_string(),
            body: "Great pacing".to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_score_out_of_range() {
        let (svc, user) = service();
        for score in [0, 11] {
            let err = svc.create_rating(user, new_rating(score)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (svc, user) = service();
        let view = svc.create_rating(user, new_rating(8)).await.unwrap();
        assert_eq!(view.author.username, "critic");

        let listed = svc.list_for_content("movie-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rating.id, view.rating.id);
        assert_eq!(listed[0].rating.reactions.like_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_author_rejected() {
        let (svc, _) = service();
        let err = svc
            .create_rating(Uuid::new_v4(), new_rating(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
