use super::ApiClient;
use categories_core::CategoryRepository;
use categories_core::model::{Category, CategoryId, NewCategory, PatchCategory};
use categories_core::result::{CategoryRepoError, OptRepoResult, RepoResult};
use engine::{Listing, Pagination};
use error_stack::ResultExt;

#[derive(Debug, Clone)]
pub struct CategoryRepo {
    api: ApiClient,
}

impl CategoryRepo {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl CategoryRepository for CategoryRepo {
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Category>> {
        self.api
            .list("categories", pagination, &[])
            .await
            .change_context(CategoryRepoError::List)
    }

    async fn search(&self, query: String, pagination: Pagination) -> RepoResult<Listing<Category>> {
        self.api
            .list("categories/search", pagination, &[("q", query.as_str())])
            .await
            .change_context(CategoryRepoError::Search)
            .attach_with(|| format!("query '{query}'"))
    }

    async fn get(&self, id: CategoryId) -> OptRepoResult<Category> {
        self.api
            .get(&format!("categories/{id}"))
            .await
            .change_context(CategoryRepoError::Get)
    }

    async fn create(&self, new_category: NewCategory) -> RepoResult<Category> {
        self.api
            .post("categories", &new_category)
            .await
            .change_context(CategoryRepoError::Create)
    }

    async fn patch(&self, id: CategoryId, patch: PatchCategory) -> OptRepoResult<Category> {
        self.api
            .patch(&format!("categories/{id}"), &patch)
            .await
            .change_context(CategoryRepoError::Patch)
    }

    async fn delete(&self, id: CategoryId) -> OptRepoResult<()> {
        self.api
            .delete(&format!("categories/{id}"))
            .await
            .change_context(CategoryRepoError::Delete)
    }
}
