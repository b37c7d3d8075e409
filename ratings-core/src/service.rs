use crate::list_filter::{RatingFilter, RatingListCriteria};
use crate::model::{NewRating, PatchRating, Rating, RatingId, StoreId};
use crate::slice::{RatingOperation, RatingSlice, RatingSummary};
use crate::{RatingEngine, RatingRepository};
use engine::error::{found, user_message};
use engine::handle::SliceHandle;
use engine::list_criteria::ListFilter;
use engine::request::{RequestState, Settlement, StalePolicy};
use engine::selector::Page;
use engine::Pagination;
use tokio::sync::watch;
use tracing::{info, instrument};

/// Dispatches rating operations against the remote API and keeps a [`RatingSlice`]
/// up to date with their outcomes.
#[derive(Debug, Clone)]
pub struct RatingService<T> {
    engine: T,
    slice: SliceHandle<RatingSlice>,
    default_page_size: u64,
}

impl<T> RatingService<T>
where
    T: RatingEngine,
{
    pub fn new(engine: T, policy: StalePolicy, default_page_size: u64) -> Self {
        RatingService {
            engine,
            slice: SliceHandle::new(RatingSlice::new(policy)),
            default_page_size,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.slice.subscribe()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&RatingSlice) -> R) -> R {
        self.slice.read(f).await
    }

    pub async fn snapshot(&self) -> RatingSlice {
        self.slice.snapshot().await
    }

    pub async fn request(&self, operation: RatingOperation) -> RequestState {
        self.read(|slice| slice.request(operation)).await
    }

    pub fn criteria(&self, pagination: Pagination) -> RatingListCriteria {
        RatingFilter::criteria(pagination, self.default_page_size)
    }

    pub async fn view(&self, criteria: &RatingListCriteria) -> Page<Rating> {
        self.read(|slice| slice.view(criteria)).await
    }

    pub async fn store_view(
        &self,
        store_id: StoreId,
        criteria: &RatingListCriteria,
    ) -> Option<Page<Rating>> {
        self.read(|slice| slice.store_view(store_id, criteria)).await
    }

    pub async fn summary(&self, store_id: StoreId) -> Option<RatingSummary> {
        self.read(|slice| slice.summary(store_id)).await
    }

    #[instrument(skip_all, name = "service#fetch_ratings")]
    pub async fn fetch_ratings(&self, pagination: Pagination) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::FetchRatings,
                async move { user_message(repo.list(pagination).await) },
                RatingSlice::settle_fetch_ratings,
            )
            .await
    }

    #[instrument(skip_all, name = "service#fetch_store_ratings", fields(%store_id))]
    pub async fn fetch_store_ratings(&self, store_id: StoreId, pagination: Pagination) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::FetchStoreRatings(store_id),
                async move { user_message(repo.list_for_store(store_id, pagination).await) },
                move |slice, ticket, result| slice.settle_fetch_store_ratings(ticket, store_id, result),
            )
            .await
    }

    #[instrument(skip_all, name = "service#fetch_rating")]
    pub async fn fetch_rating(&self, id: RatingId) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::FetchRating,
                async move { found(repo.get(id).await, format!("rating {id}")) },
                RatingSlice::settle_fetch_rating,
            )
            .await
    }

    #[instrument(skip_all, name = "service#create_rating")]
    pub async fn create_rating(&self, new_rating: NewRating) -> Settlement {
        if let Err(invalid) = new_rating.validate() {
            return self
                .slice
                .refuse(RatingOperation::CreateRating, invalid.to_string())
                .await;
        }
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::CreateRating,
                async move { user_message(repo.create(new_rating).await) },
                RatingSlice::settle_create,
            )
            .await
    }

    #[instrument(skip_all, name = "service#update_rating")]
    pub async fn update_rating(&self, id: RatingId, patch: PatchRating) -> Settlement {
        if let Err(invalid) = patch.validate() {
            return self
                .slice
                .refuse(RatingOperation::UpdateRating, invalid.to_string())
                .await;
        }
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::UpdateRating,
                async move { found(repo.patch(id, patch).await, format!("rating {id}")) },
                RatingSlice::settle_patch,
            )
            .await
    }

    #[instrument(skip_all, name = "service#delete_rating")]
    pub async fn delete_rating(&self, id: RatingId) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::DeleteRating,
                async move { found(repo.delete(id).await, format!("rating {id}")) },
                move |slice, ticket, result| slice.settle_delete(ticket, id, result),
            )
            .await
    }

    #[instrument(skip_all, name = "service#like_rating")]
    pub async fn like_rating(&self, id: RatingId) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                RatingOperation::LikeRating,
                async move { found(repo.like(id).await, format!("rating {id}")) },
                RatingSlice::settle_patch,
            )
            .await
    }

    /// Local only, the remote API is not involved.
    pub async fn forget_store(&self, store_id: StoreId) -> usize {
        let forgotten = self.slice.update(|slice| slice.forget_store(store_id)).await;
        info!(%store_id, forgotten, "forgot store ratings");
        forgotten
    }

    /// Drops whatever is in flight for `operation`; late responses will be ignored.
    pub async fn cancel(&self, operation: RatingOperation) -> bool {
        self.slice.cancel(operation).await
    }

    pub async fn clear_error(&self, operation: RatingOperation) -> Option<String> {
        self.slice.clear_error(operation).await
    }
}
