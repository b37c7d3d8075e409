use super::{Table, page_of};
use categories_core::CategoryRepository;
use categories_core::model::{Category, CategoryId, NewCategory, PatchCategory};
use categories_core::result::{OptRepoResult, RepoResult};
use engine::selector::contains_text;
use engine::{Listing, Pagination};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Categories ordered by id.
#[derive(Debug, Clone)]
pub struct MemoryCategoryRepo {
    table: Arc<RwLock<Table<Category>>>,
}

impl Default for MemoryCategoryRepo {
    fn default() -> Self {
        Self::with_categories(Vec::new())
    }
}

impl MemoryCategoryRepo {
    pub fn with_categories(mut categories: Vec<Category>) -> Self {
        categories.sort_by_key(|category| category.id);
        categories.dedup_by_key(|category| category.id);
        Self {
            table: Arc::new(RwLock::new(Table::new(categories, |c| c.id.0))),
        }
    }
}

impl CategoryRepository for MemoryCategoryRepo {
    async fn list(&self, pagination: Pagination) -> RepoResult<Listing<Category>> {
        let table = self.table.read().await;
        Ok(page_of(table.rows.iter().collect(), pagination))
    }

    async fn search(&self, query: String, pagination: Pagination) -> RepoResult<Listing<Category>> {
        let table = self.table.read().await;
        let matches = table
            .rows
            .iter()
            .filter(|category| {
                contains_text(&category.name, &query)
                    || category
                        .description
                        .as_deref()
                        .is_some_and(|description| contains_text(description, &query))
            })
            .collect();
        Ok(page_of(matches, pagination))
    }

    async fn get(&self, id: CategoryId) -> OptRepoResult<Category> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|category| category.id == id).cloned())
    }

    async fn create(&self, new_category: NewCategory) -> RepoResult<Category> {
        let mut table = self.table.write().await;
        let category = Category::create(CategoryId(table.next_id()), new_category);
        debug!(id = %category.id, "created category");
        table.rows.push(category.clone());
        Ok(category)
    }

    async fn patch(&self, id: CategoryId, patch: PatchCategory) -> OptRepoResult<Category> {
        let mut table = self.table.write().await;
        Ok(table
            .rows
            .iter_mut()
            .find(|category| category.id == id)
            .map(|category| {
                patch.apply(category);
                category.clone()
            }))
    }

    async fn delete(&self, id: CategoryId) -> OptRepoResult<()> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|category| category.id != id);
        Ok((table.rows.len() != before).then_some(()))
    }
}
