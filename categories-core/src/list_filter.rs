use crate::model::{Category, CategoryId};
use chrono::{DateTime, Utc};
use engine::Pagination;
use engine::list_criteria::{ListCriteria, ListFilter, Tag};
use engine::selector::{SortKey, compare_text, contains_text};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Categories without a parent.
    Root,
    /// Direct children of the given category.
    Of(CategoryId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Status(CategoryStatus),
    Parent(ParentFilter),
    /// At least this many stores.
    MinStores(u64),
    /// Case-insensitive match on name or description.
    Text(String),
    CreatedAfter(DateTime<Utc>),
}

impl ListFilter for CategoryFilter {
    const MAX_FILTER_COUNT: usize = MAX_FILTER_COUNT;
    type Item = Category;
    type Criteria = CategoryListCriteria;

    fn tag(&self) -> Tag {
        match self {
            CategoryFilter::Status(_) => Tag::One,
            CategoryFilter::Parent(_) => Tag::Two,
            CategoryFilter::MinStores(_) => Tag::Four,
            CategoryFilter::Text(_) => Tag::Eight,
            CategoryFilter::CreatedAfter(_) => Tag::Sixteen,
        }
    }

    fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryFilter::Status(CategoryStatus::Active) => category.is_active,
            CategoryFilter::Status(CategoryStatus::Inactive) => !category.is_active,
            CategoryFilter::Parent(ParentFilter::Root) => category.parent_id.is_none(),
            CategoryFilter::Parent(ParentFilter::Of(parent)) => {
                category.parent_id.as_ref() == Some(parent)
            }
            CategoryFilter::MinStores(min) => category.store_count >= *min,
            CategoryFilter::Text(query) => {
                contains_text(&category.name, query)
                    || category
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_text(d, query))
            }
            CategoryFilter::CreatedAfter(after) => category.created > *after,
        }
    }

    fn criteria(pagination: Pagination, default_page_size: u64) -> Self::Criteria {
        CategoryListCriteria::new(pagination, default_page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySort {
    Name,
    StoreCount,
    Created,
}

impl SortKey<Category> for CategorySort {
    fn compare(&self, a: &Category, b: &Category) -> Ordering {
        match self {
            CategorySort::Name => compare_text(&a.name, &b.name),
            CategorySort::StoreCount => a.store_count.cmp(&b.store_count),
            CategorySort::Created => a.created.cmp(&b.created),
        }
    }
}

pub type CategoryListCriteria = ListCriteria<CategoryFilter, CategorySort, MAX_FILTER_COUNT>;

const MAX_FILTER_COUNT: usize = 5;
