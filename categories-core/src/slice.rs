//! Client-side state for categories: the normalized collection, the lifecycle of every
//! category operation and the counters derived from the collection.
use crate::list_filter::CategoryListCriteria;
use crate::model::{Category, CategoryId};
use engine::handle::Slice;
use engine::request::{
    OperationKey, RequestState, RequestTracker, Settled, Settlement, StalePolicy, Ticket,
};
use engine::selector::{self, Page};
use engine::store::{EntityStore, Inserted};
use engine::{Listing, PageInfo};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryOperation {
    FetchCategories,
    FetchCategory,
    SearchCategories,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
}

impl OperationKey for CategoryOperation {
    fn name(&self) -> &'static str {
        match self {
            CategoryOperation::FetchCategories => "fetchCategories",
            CategoryOperation::FetchCategory => "fetchCategory",
            CategoryOperation::SearchCategories => "searchCategories",
            CategoryOperation::CreateCategory => "createCategory",
            CategoryOperation::UpdateCategory => "updateCategory",
            CategoryOperation::DeleteCategory => "deleteCategory",
        }
    }

    fn supersedable(&self) -> bool {
        matches!(
            self,
            CategoryOperation::FetchCategories
                | CategoryOperation::FetchCategory
                | CategoryOperation::SearchCategories
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CategoryGroup {
    SearchResults,
}

/// Totals over the main category collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

impl CategoryCounts {
    fn of<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Self {
        categories.into_iter().fold(Self::default(), |mut counts, category| {
            counts.add(category);
            counts
        })
    }

    fn add(&mut self, category: &Category) {
        self.total += 1;
        if category.is_active {
            self.active += 1;
        } else {
            self.inactive += 1;
        }
    }

    fn subtract(&mut self, category: &Category) {
        self.total = self.total.saturating_sub(1);
        if category.is_active {
            self.active = self.active.saturating_sub(1);
        } else {
            self.inactive = self.inactive.saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategorySlice {
    store: EntityStore<Category, CategoryGroup>,
    requests: RequestTracker<CategoryOperation>,
    counts: CategoryCounts,
    page_info: Option<PageInfo>,
    search_query: Option<String>,
}

impl Slice for CategorySlice {
    type Operation = CategoryOperation;

    fn requests(&mut self) -> &mut RequestTracker<CategoryOperation> {
        &mut self.requests
    }
}

impl CategorySlice {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            requests: RequestTracker::new(policy),
            ..Default::default()
        }
    }

    pub fn begin(&mut self, operation: CategoryOperation) -> Ticket<CategoryOperation> {
        self.requests.begin(operation)
    }

    pub fn settle_fetch_categories(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        result: Result<Listing<Category>, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(listing) => {
                self.store.replace_all(listing.data);
                self.counts = CategoryCounts::of(self.store.iter());
                self.page_info = listing.pagination;
                debug!(count = self.store.len(), "categories replaced");
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_search(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        query: String,
        result: Result<Listing<Category>, String>,
    ) -> Settlement {
        match self.requests.settle(ticket, result) {
            Settled::Fulfilled(listing) => {
                self.store.set_group(CategoryGroup::SearchResults, listing.data);
                self.search_query = Some(query);
                Settlement::Fulfilled
            }
            other => other.settlement(),
        }
    }

    pub fn settle_fetch_category(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        result: Result<Category, String>,
    ) -> Settlement {
        let settled = self.requests.settle(ticket, result);
        if let Settled::Fulfilled(category) = &settled {
            if let Some(previous) = self.store.get(&category.id).cloned() {
                self.patch_listed(&previous, category.clone());
            }
            self.store.select(category.clone());
        }
        settled.settlement()
    }

    pub fn settle_create(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        result: Result<Category, String>,
    ) -> Settlement {
        let settled = self.requests.settle(ticket, result);
        if let Settled::Fulfilled(category) = &settled {
            let was_listed = self.store.contains(&category.id);
            if let Inserted::Replaced(previous) = self.store.insert_one(category.clone()) {
                if was_listed {
                    self.counts.subtract(&previous);
                }
            }
            self.counts.add(category);
        }
        settled.settlement()
    }

    pub fn settle_update(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        result: Result<Category, String>,
    ) -> Settlement {
        let settled = self.requests.settle(ticket, result);
        if let Settled::Fulfilled(category) = &settled {
            match self.store.get(&category.id).cloned() {
                Some(previous) => self.patch_listed(&previous, category.clone()),
                None => debug!(id = %category.id, "updated category is not loaded, nothing to patch"),
            }
        }
        settled.settlement()
    }

    pub fn settle_delete(
        &mut self,
        ticket: Ticket<CategoryOperation>,
        id: CategoryId,
        result: Result<(), String>,
    ) -> Settlement {
        let settled = self.requests.settle(ticket, result);
        if let Settled::Fulfilled(()) = settled {
            let was_listed = self.store.contains(&id);
            match self.store.remove_one(&id) {
                Some(removed) if was_listed => self.counts.subtract(&removed),
                Some(_) => {}
                None => debug!(%id, "deleted category is not loaded, nothing to remove"),
            }
        }
        settled.settlement()
    }

    fn patch_listed(&mut self, previous: &Category, category: Category) {
        if self.store.contains(&previous.id) {
            self.counts.subtract(previous);
            self.counts.add(&category);
        }
        self.store.patch_one(&previous.id, category);
    }

    pub fn request(&self, operation: CategoryOperation) -> RequestState {
        self.requests.state(operation)
    }

    pub fn error(&self, operation: CategoryOperation) -> Option<&str> {
        self.requests.error(operation)
    }

    pub fn is_loading(&self) -> bool {
        self.requests.is_loading()
    }

    pub fn counts(&self) -> CategoryCounts {
        self.counts
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.page_info
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Snapshot of the main collection.
    pub fn categories(&self) -> Vec<Category> {
        self.store.iter().cloned().collect()
    }

    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.store.get(&id).cloned()
    }

    pub fn selected(&self) -> Option<Category> {
        self.store.selected().cloned()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn search_results(&self) -> Vec<Category> {
        self.store
            .group(&CategoryGroup::SearchResults)
            .map(|results| results.cloned().collect())
            .unwrap_or_default()
    }

    pub fn view(&self, criteria: &CategoryListCriteria) -> Page<Category> {
        selector::select(self.store.iter(), criteria)
    }

    pub fn view_all(&self, criteria: &CategoryListCriteria) -> Vec<Category> {
        selector::select_all(self.store.iter(), criteria)
    }

    /// Categories without a parent.
    pub fn roots(&self) -> Vec<Category> {
        self.store.iter().filter(|c| c.is_root()).cloned().collect()
    }

    pub fn children_of(&self, id: CategoryId) -> Vec<Category> {
        self.store
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .cloned()
            .collect()
    }

    /// Categories whose parent is not part of the collection.
    pub fn orphans(&self) -> Vec<Category> {
        self.store
            .iter()
            .filter(|c| c.parent_id.is_some_and(|parent| !self.store.contains(&parent)))
            .cloned()
            .collect()
    }

    /// The chain of loaded parents of `id`, nearest first. Stops at a missing parent or a cycle.
    pub fn ancestors(&self, id: CategoryId) -> Vec<Category> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut next = self.store.get(&id).and_then(|c| c.parent_id);

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.store.get(&parent_id) else {
                break;
            };
            next = parent.parent_id;
            ancestors.push(parent.clone());
        }

        ancestors
    }
}
