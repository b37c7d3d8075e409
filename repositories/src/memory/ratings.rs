use super::{Table, page_of};
use engine::{Listing, Pagination};
use ratings_core::RatingRepository;
use ratings_core::model::{NewRating, PatchRating, Rating, RatingId, StoreId};
use ratings_core::result::{OptRepoResult, RepoResult};
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Ratings ordered newest first.
#[derive(Debug, Clone)]
pub struct MemoryRatingRepo {
    table: Arc<RwLock<Table<Rating>>>,
}

impl Default for MemoryRatingRepo {
    fn default() -> Self {
        Self::with_ratings(Vec::new())
    }
}

impl MemoryRatingRepo {
    pub fn with_ratings(mut ratings: Vec<Rating>) -> Self {
        ratings.sort_by_key(|rating| rating.id);
        ratings.dedup_by_key(|rating| rating.id);
        ratings.sort_by_key(|rating| Reverse((rating.created_at, rating.id)));
        Self {
            table: Arc::new(RwLock::new(Table::new(ratings, |r| r.id.0))),
        }
    }
}

impl RatingRepository for MemoryRatingRepo {
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Rating>> {
        let table = self.table.read().await;
        Ok(page_of(table.rows.iter().collect(), pagination))
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
        pagination: Pagination,
    ) -> RepoResult<Listing<Rating>> {
        let table = self.table.read().await;
        let ratings = table
            .rows
            .iter()
            .filter(|rating| rating.store_id == store_id)
            .collect();
        Ok(page_of(ratings, pagination))
    }

    async fn get(&self, id: RatingId) -> OptRepoResult<Rating> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|rating| rating.id == id).cloned())
    }

    async fn create(&self, new_rating: NewRating) -> RepoResult<Rating> {
        let mut table = self.table.write().await;
        let rating = Rating::create(RatingId(table.next_id()), new_rating);
        debug!(id = %rating.id, store_id = %rating.store_id, "created rating");
        table.rows.insert(0, rating.clone());
        Ok(rating)
    }

    async fn patch(&self, id: RatingId, patch: PatchRating) -> OptRepoResult<Rating> {
        let mut table = self.table.write().await;
        Ok(table
            .rows
            .iter_mut()
            .find(|rating| rating.id == id)
            .map(|rating| {
                patch.apply(rating);
                rating.clone()
            }))
    }

    async fn delete(&self, id: RatingId) -> OptRepoResult<()> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|rating| rating.id != id);
        Ok((table.rows.len() != before).then_some(()))
    }

    async fn like(&self, id: RatingId) -> OptRepoResult<Rating> {
        let mut table = self.table.write().await;
        Ok(table
            .rows
            .iter_mut()
            .find(|rating| rating.id == id)
            .map(|rating| {
                rating.likes += 1;
                rating.clone()
            }))
    }
}
