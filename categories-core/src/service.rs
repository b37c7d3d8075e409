use crate::list_filter::{CategoryFilter, CategoryListCriteria};
use crate::model::{Category, CategoryId, NewCategory, PatchCategory};
use crate::slice::{CategoryCounts, CategoryOperation, CategorySlice};
use crate::{CategoryEngine, CategoryRepository};
use engine::error::{found, user_message};
use engine::handle::SliceHandle;
use engine::list_criteria::ListFilter;
use engine::request::{RequestState, Settlement, StalePolicy};
use engine::selector::Page;
use engine::{Listing, Pagination};
use tokio::sync::watch;
use tracing::instrument;

/// Dispatches category operations against the remote API and keeps a [`CategorySlice`]
/// up to date with their outcomes.
#[derive(Debug, Clone)]
pub struct CategoryService<T> {
    engine: T,
    slice: SliceHandle<CategorySlice>,
    default_page_size: u64,
}

impl<T> CategoryService<T>
where
    T: CategoryEngine,
{
    pub fn new(engine: T, policy: StalePolicy, default_page_size: u64) -> Self {
        CategoryService {
            engine,
            slice: SliceHandle::new(CategorySlice::new(policy)),
            default_page_size,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.slice.subscribe()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&CategorySlice) -> R) -> R {
        self.slice.read(f).await
    }

    pub async fn snapshot(&self) -> CategorySlice {
        self.slice.snapshot().await
    }

    pub async fn request(&self, operation: CategoryOperation) -> RequestState {
        self.read(|slice| slice.request(operation)).await
    }

    pub async fn counts(&self) -> CategoryCounts {
        self.read(CategorySlice::counts).await
    }

    pub fn criteria(&self, pagination: Pagination) -> CategoryListCriteria {
        CategoryFilter::criteria(pagination, self.default_page_size)
    }

    pub async fn view(&self, criteria: &CategoryListCriteria) -> Page<Category> {
        self.read(|slice| slice.view(criteria)).await
    }

    #[instrument(skip_all, name = "service#fetch_categories")]
    pub async fn fetch_categories(&self, pagination: Pagination) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                CategoryOperation::FetchCategories,
                async move { user_message(repo.list(pagination).await) },
                CategorySlice::settle_fetch_categories,
            )
            .await
    }

    #[instrument(skip_all, name = "service#search_categories")]
    pub async fn search_categories(&self, query: String, pagination: Pagination) -> Settlement {
        let repo = self.engine.repo();
        let remote_query = query.clone();
        self.slice
            .dispatch(
                CategoryOperation::SearchCategories,
                async move { user_message(repo.search(remote_query, pagination).await) },
                |slice, ticket, result: Result<Listing<Category>, String>| {
                    slice.settle_search(ticket, query, result)
                },
            )
            .await
    }

    #[instrument(skip_all, name = "service#fetch_category")]
    pub async fn fetch_category(&self, id: CategoryId) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                CategoryOperation::FetchCategory,
                async move { found(repo.get(id).await, format!("category {id}")) },
                CategorySlice::settle_fetch_category,
            )
            .await
    }

    #[instrument(skip_all, name = "service#create_category")]
    pub async fn create_category(&self, new_category: NewCategory) -> Settlement {
        if let Err(invalid) = new_category.validate() {
            return self
                .slice
                .refuse(CategoryOperation::CreateCategory, invalid.to_string())
                .await;
        }
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                CategoryOperation::CreateCategory,
                async move { user_message(repo.create(new_category).await) },
                CategorySlice::settle_create,
            )
            .await
    }

    #[instrument(skip_all, name = "service#update_category")]
    pub async fn update_category(&self, id: CategoryId, patch: PatchCategory) -> Settlement {
        if let Err(invalid) = patch.validate(id) {
            return self
                .slice
                .refuse(CategoryOperation::UpdateCategory, invalid.to_string())
                .await;
        }
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                CategoryOperation::UpdateCategory,
                async move { found(repo.patch(id, patch).await, format!("category {id}")) },
                CategorySlice::settle_update,
            )
            .await
    }

    #[instrument(skip_all, name = "service#delete_category")]
    pub async fn delete_category(&self, id: CategoryId) -> Settlement {
        let repo = self.engine.repo();
        self.slice
            .dispatch(
                CategoryOperation::DeleteCategory,
                async move { found(repo.delete(id).await, format!("category {id}")) },
                move |slice, ticket, result| slice.settle_delete(ticket, id, result),
            )
            .await
    }

    /// Drops whatever is in flight for `operation`; late responses will be ignored.
    pub async fn cancel(&self, operation: CategoryOperation) -> bool {
        self.slice.cancel(operation).await
    }

    pub async fn clear_error(&self, operation: CategoryOperation) -> Option<String> {
        self.slice.clear_error(operation).await
    }
}
