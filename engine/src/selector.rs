//! Read-only projections over a collection: filter, then sort, then paginate.
//!
//! Every projection clones the entities it returns, so a [`Page`] never borrows
//! from (or hands out mutable access to) the store it was derived from.
use crate::list_criteria::{ListCriteria, ListFilter};
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Orders two `T`s by one of their fields.
pub trait SortKey<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K> Sort<K> {
    pub fn ascending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    pub fn compare<T>(&self, a: &T, b: &T) -> Ordering
    where
        K: SortKey<T>,
    {
        let ordering = self.key.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Case-insensitive ordering of two strings.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive substring match. An empty `needle` matches everything.
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub page_count: u64,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.page >= self.page_count
    }
}

/// Filters and sorts `items` without paginating. Ties keep their original order.
pub fn select_all<'a, T, F, K, const N: usize>(
    items: impl IntoIterator<Item = &'a T>,
    criteria: &ListCriteria<F, K, N>,
) -> Vec<T>
where
    T: Clone + 'a,
    F: ListFilter<Item = T>,
    K: SortKey<T>,
{
    filter_and_sort(items, criteria).into_iter().cloned().collect()
}

/// Derives the page `criteria` asks for out of `items`.
pub fn select<'a, T, F, K, const N: usize>(
    items: impl IntoIterator<Item = &'a T>,
    criteria: &ListCriteria<F, K, N>,
) -> Page<T>
where
    T: Clone + 'a,
    F: ListFilter<Item = T>,
    K: SortKey<T>,
{
    let matched = filter_and_sort(items, criteria);
    paginate(matched, criteria.page(), criteria.page_size())
}

fn filter_and_sort<'a, T, F, K, const N: usize>(
    items: impl IntoIterator<Item = &'a T>,
    criteria: &ListCriteria<F, K, N>,
) -> Vec<&'a T>
where
    T: 'a,
    F: ListFilter<Item = T>,
    K: SortKey<T>,
{
    let filtered = items.into_iter().filter(|item| criteria.matches(item));
    match criteria.sort() {
        Some(sort) => filtered.sorted_by(|a, b| sort.compare(*a, *b)).collect(),
        None => filtered.collect(),
    }
}

/// `page` is 1 based. Page 0 is read as page 1 and a page size of 0 as 1.
pub fn paginate<T: Clone>(items: Vec<&T>, page: u64, page_size: u64) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len() as u64;
    let start = usize::try_from((page - 1).saturating_mul(page_size))
        .unwrap_or(usize::MAX);
    let take = usize::try_from(page_size).unwrap_or(usize::MAX);

    Page {
        items: items.into_iter().skip(start).take(take).cloned().collect(),
        page,
        page_size,
        total,
        page_count: total.div_ceil(page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_criteria::Tag;
    use crate::pagination::Pagination;
    use rstest::rstest;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
        weight: u32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum ItemSort {
        Name,
        Weight,
    }

    impl SortKey<Item> for ItemSort {
        fn compare(&self, a: &Item, b: &Item) -> Ordering {
            match self {
                ItemSort::Name => compare_text(a.name, b.name),
                ItemSort::Weight => a.weight.cmp(&b.weight),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ItemFilter {
        Name(String),
        MinWeight(u32),
    }

    type ItemCriteria = ListCriteria<ItemFilter, ItemSort, 2>;

    impl ListFilter for ItemFilter {
        const MAX_FILTER_COUNT: usize = 2;
        type Item = Item;
        type Criteria = ItemCriteria;

        fn tag(&self) -> Tag {
            match self {
                ItemFilter::Name(_) => Tag::One,
                ItemFilter::MinWeight(_) => Tag::Two,
            }
        }

        fn matches(&self, item: &Item) -> bool {
            match self {
                ItemFilter::Name(q) => contains_text(item.name, q),
                ItemFilter::MinWeight(w) => item.weight >= *w,
            }
        }

        fn criteria(pagination: Pagination, default_page_size: u64) -> Self::Criteria {
            ListCriteria::new(pagination, default_page_size)
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "pear", weight: 3 },
            Item { id: 2, name: "Apple", weight: 7 },
            Item { id: 3, name: "banana", weight: 5 },
            Item { id: 4, name: "apricot", weight: 1 },
            Item { id: 5, name: "Cherry", weight: 9 },
        ]
    }

    fn ids(items: &[Item]) -> Vec<u32> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn text_comparison_ignores_case() {
        assert_eq!(Ordering::Equal, compare_text("Apple", "aPPLE"));
        assert_eq!(Ordering::Less, compare_text("apple", "Banana"));
        assert!(contains_text("Grocery Store", "store"));
        assert!(contains_text("anything", ""));
        assert!(!contains_text("Grocery", "bakery"));
    }

    #[test]
    fn sort_by_name_is_case_insensitive() {
        let items = items();
        let criteria = ItemFilter::criteria(Pagination::default(), 10)
            .sorted(Sort::ascending(ItemSort::Name));

        let page = select(&items, &criteria);

        assert_eq!(vec![2, 4, 3, 5, 1], ids(&page.items));
    }

    #[test]
    fn ascending_then_descending_is_reversed() {
        let items = items();
        let asc = select_all(
            &items,
            &ItemFilter::criteria(Pagination::default(), 10).sorted(Sort::ascending(ItemSort::Weight)),
        );
        let mut desc = select_all(
            &items,
            &ItemFilter::criteria(Pagination::default(), 10)
                .sorted(Sort::descending(ItemSort::Weight)),
        );
        desc.reverse();

        assert_eq!(asc, desc);
    }

    #[test]
    fn ties_keep_original_order() {
        let items = vec![
            Item { id: 1, name: "a", weight: 1 },
            Item { id: 2, name: "b", weight: 1 },
            Item { id: 3, name: "c", weight: 0 },
        ];
        let criteria = ItemFilter::criteria(Pagination::default(), 10)
            .sorted(Sort::descending(ItemSort::Weight));

        assert_eq!(vec![1, 2, 3], ids(&select_all(&items, &criteria)));
    }

    #[test]
    fn unsorted_selection_keeps_collection_order() {
        let items = items();
        let criteria = ItemFilter::criteria(Pagination::default(), 10).with(ItemFilter::MinWeight(5));

        assert_eq!(vec![2, 3, 5], ids(&select_all(&items, &criteria)));
    }

    #[rstest]
    #[case::first(1, vec![1, 2])]
    #[case::zero_reads_as_first(0, vec![1, 2])]
    #[case::middle(2, vec![3, 4])]
    #[case::last_partial(3, vec![5])]
    #[case::past_the_end(4, vec![])]
    fn paginates_by_page_size(#[case] page: u64, #[case] expected: Vec<u32>) {
        let items = items();
        let criteria = ItemFilter::criteria(Pagination::with_page_size(page, 2), 10);

        let selected = select(&items, &criteria);

        assert_eq!(expected, ids(&selected.items));
        assert_eq!(5, selected.total);
        assert_eq!(3, selected.page_count);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    fn pages_concatenate_to_full_selection(#[case] page_size: u64) {
        let items = items();
        let base = ItemFilter::criteria(Pagination::with_page_size(1, page_size), 10)
            .with(ItemFilter::Name("a".into()))
            .sorted(Sort::ascending(ItemSort::Name));
        let full = select_all(&items, &base);

        let first = select(&items, &base);
        let mut concatenated = Vec::new();
        for page in 1..=first.page_count {
            let page = select(&items, &base.clone().at_page(page));
            assert!(page.items.len() as u64 <= page_size);
            concatenated.extend(page.items);
        }

        assert_eq!(full, concatenated);
    }

    #[test]
    fn paginate_clamps_page_and_page_size() {
        let source = items();

        let page = paginate(source.iter().collect(), 0, 0);

        assert_eq!(vec![1], ids(&page.items));
        assert_eq!(1, page.page);
        assert_eq!(1, page.page_size);
        assert_eq!(source.len() as u64, page.page_count);
    }

    #[test]
    fn empty_selection_has_no_pages() {
        let items: Vec<Item> = vec![];
        let page = select(&items, &ItemFilter::criteria(Pagination::default(), 10));
        assert_eq!(0, page.total);
        assert_eq!(0, page.page_count);
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn selection_does_not_touch_source() {
        let items = items();
        let before = items.clone();
        let criteria = ItemFilter::criteria(Pagination::with_page_size(1, 2), 10)
            .sorted(Sort::descending(ItemSort::Name));

        let mut page = select(&items, &criteria);
        page.items[0].name = "changed";

        assert_eq!(before, items);
    }
}
