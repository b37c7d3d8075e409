use super::ApiClient;
use engine::{Listing, Pagination};
use error_stack::ResultExt;
use ratings_core::RatingRepository;
use ratings_core::model::{NewRating, PatchRating, Rating, RatingId, StoreId};
use ratings_core::result::{OptRepoResult, RatingRepoError, RepoResult};

#[derive(Debug, Clone)]
pub struct RatingRepo {
    api: ApiClient,
}

impl RatingRepo {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl RatingRepository for RatingRepo {
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Rating>> {
        self.api
            .list("ratings", pagination, &[])
            .await
            .change_context(RatingRepoError::List)
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
        pagination: Pagination,
    ) -> RepoResult<Listing<Rating>> {
        self.api
            .list(&format!("stores/{store_id}/ratings"), pagination, &[])
            .await
            .change_context(RatingRepoError::ListForStore)
            .attach_with(|| format!("store {store_id}"))
    }

    async fn get(&self, id: RatingId) -> OptRepoResult<Rating> {
        self.api
            .get(&format!("ratings/{id}"))
            .await
            .change_context(RatingRepoError::Get)
    }

    async fn create(&self, new_rating: NewRating) -> RepoResult<Rating> {
        self.api
            .post("ratings", &new_rating)
            .await
            .change_context(RatingRepoError::Create)
    }

    async fn patch(&self, id: RatingId, patch: PatchRating) -> OptRepoResult<Rating> {
        self.api
            .patch(&format!("ratings/{id}"), &patch)
            .await
            .change_context(RatingRepoError::Patch)
    }

    async fn delete(&self, id: RatingId) -> OptRepoResult<()> {
        self.api
            .delete(&format!("ratings/{id}"))
            .await
            .change_context(RatingRepoError::Delete)
    }

    async fn like(&self, id: RatingId) -> OptRepoResult<Rating> {
        self.api
            .post_action(&format!("ratings/{id}/like"))
            .await
            .change_context(RatingRepoError::Like)
    }
}
