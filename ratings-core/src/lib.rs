use engine::{Listing, Pagination};
use model::{NewRating, PatchRating, Rating, RatingId, StoreId};
use result::{OptRepoResult, RepoResult};
use std::sync::Arc;

pub mod list_filter;
pub mod model;
pub mod result;
pub mod service;
pub mod slice;

pub trait RatingEngine: Clone + Send + Sync + 'static {
    type Repo: RatingRepository + Send + Sync + 'static;

    fn repo(&self) -> Self::Repo;
}

/// The remote API serving ratings.
pub trait RatingRepository {
    /// The most recent ratings across all stores.
    fn list(&self, pagination: Pagination) -> impl Future<Output = RepoResult<Listing<Rating>>> + Send;

    fn list_for_store(
        &self,
        store_id: StoreId,
        pagination: Pagination,
    ) -> impl Future<Output = RepoResult<Listing<Rating>>> + Send;

    fn get(&self, id: RatingId) -> impl Future<Output = OptRepoResult<Rating>> + Send;

    fn create(&self, new_rating: NewRating) -> impl Future<Output = RepoResult<Rating>> + Send;

    fn patch(
        &self,
        id: RatingId,
        patch: PatchRating,
    ) -> impl Future<Output = OptRepoResult<Rating>> + Send;

    fn delete(&self, id: RatingId) -> impl Future<Output = OptRepoResult<()>> + Send;

    /// Answers with the rating as it is after the like was counted.
    fn like(&self, id: RatingId) -> impl Future<Output = OptRepoResult<Rating>> + Send;
}

impl<T> RatingRepository for Arc<T>
where
    T: RatingRepository + Send + Sync,
{
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Rating>> {
        (**self).list(pagination).await
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
        pagination: Pagination,
    ) -> RepoResult<Listing<Rating>> {
        (**self).list_for_store(store_id, pagination).await
    }

    async fn get(&self, id: RatingId) -> OptRepoResult<Rating> {
        (**self).get(id).await
    }

    async fn create(&self, new_rating: NewRating) -> RepoResult<Rating> {
        (**self).create(new_rating).await
    }

    async fn patch(&self, id: RatingId, patch: PatchRating) -> OptRepoResult<Rating> {
        (**self).patch(id, patch).await
    }

    async fn delete(&self, id: RatingId) -> OptRepoResult<()> {
        (**self).delete(id).await
    }

    async fn like(&self, id: RatingId) -> OptRepoResult<Rating> {
        (**self).like(id).await
    }
}
