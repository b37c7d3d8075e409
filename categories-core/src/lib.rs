use engine::{Listing, Pagination};
use model::{Category, CategoryId, NewCategory, PatchCategory};
use result::{OptRepoResult, RepoResult};
use std::sync::Arc;

pub mod list_filter;
pub mod model;
pub mod result;
pub mod service;
pub mod slice;

pub trait CategoryEngine: Clone + Send + Sync + 'static {
    type Repo: CategoryRepository + Send + Sync + 'static;

    fn repo(&self) -> Self::Repo;
}

/// The remote API serving categories.
pub trait CategoryRepository {
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RepoResult<Listing<Category>>> + Send;

    fn search(
        &self,
        query: String,
        pagination: Pagination,
    ) -> impl Future<Output = RepoResult<Listing<Category>>> + Send;

    fn get(&self, id: CategoryId) -> impl Future<Output = OptRepoResult<Category>> + Send;

    fn create(
        &self,
        new_category: NewCategory,
    ) -> impl Future<Output = RepoResult<Category>> + Send;

    fn patch(
        &self,
        id: CategoryId,
        patch: PatchCategory,
    ) -> impl Future<Output = OptRepoResult<Category>> + Send;

    fn delete(&self, id: CategoryId) -> impl Future<Output = OptRepoResult<()>> + Send;
}

impl<T> CategoryRepository for Arc<T>
where
    T: CategoryRepository + Send + Sync,
{
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Category>> {
        (**self).list(pagination).await
    }

    async fn search(
        &self,
        query: String,
        pagination: Pagination,
    ) -> RepoResult<Listing<Category>> {
        (**self).search(query, pagination).await
    }

    async fn get(&self, id: CategoryId) -> OptRepoResult<Category> {
        (**self).get(id).await
    }

    async fn create(&self, new_category: NewCategory) -> RepoResult<Category> {
        (**self).create(new_category).await
    }

    async fn patch(&self, id: CategoryId, patch: PatchCategory) -> OptRepoResult<Category> {
        (**self).patch(id, patch).await
    }

    async fn delete(&self, id: CategoryId) -> OptRepoResult<()> {
        (**self).delete(id).await
    }
}
