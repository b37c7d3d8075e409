use crate::pagination::Pagination;
use crate::selector::{Sort, SortKey};
use const_format::formatcp;

type MaxFilterCountType = u8;
const MAX: usize = MaxFilterCountType::BITS as usize;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
    SixtyFour = 64,
    OneTwentyEight = 128,
}

impl Tag {
    const NONE: MaxFilterCountType = 0;
}

/// A single criterion that can narrow down a list of `Item`s.
///
/// Every variant of an implementing enum should map to its own [`Tag`], since
/// criteria only hold one filter per tag.
pub trait ListFilter {
    const MAX_FILTER_COUNT: usize;
    type Item;
    type Criteria;

    fn tag(&self) -> Tag;
    fn matches(&self, item: &Self::Item) -> bool;
    fn criteria(pagination: Pagination, default_page_size: u64) -> Self::Criteria;
}

/// The filters, sort and page used to derive a view over a collection.
///
/// `N` cannot be larger than the number of available tags.
/// ```compile_fail
/// use engine::Pagination;
/// use engine::list_criteria::ListCriteria;
/// let _ = ListCriteria::<(), (), 9>::new(Pagination::default(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCriteria<F, K, const N: usize> {
    filters: Vec<F>,
    applied: MaxFilterCountType,
    sort: Option<Sort<K>>,
    pagination: Pagination,
    default_page_size: u64,
}

impl<F, K, const N: usize> ListCriteria<F, K, N> {
    pub fn new(pagination: Pagination, default_page_size: u64) -> Self {
        const {
            assert!(
                N <= MAX,
                "{}",
                formatcp!("ListCriteria only supports up to {} filters", MAX)
            )
        };
        Self {
            filters: Vec::with_capacity(N),
            applied: Tag::NONE,
            sort: None,
            pagination,
            default_page_size,
        }
    }

    pub fn page(&self) -> u64 {
        self.pagination.page()
    }

    pub fn page_size(&self) -> u64 {
        self.pagination.page_size_or(self.default_page_size)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn filters(&self) -> &[F] {
        &self.filters
    }

    pub fn sort(&self) -> Option<&Sort<K>> {
        self.sort.as_ref()
    }

    pub fn set_sort(&mut self, sort: Sort<K>) -> &mut Self {
        self.sort = Some(sort);
        self
    }

    pub fn sorted(mut self, sort: Sort<K>) -> Self {
        self.set_sort(sort);
        self
    }

    pub fn set_page(&mut self, page: u64) -> &mut Self {
        self.pagination.page = page;
        self
    }

    pub fn at_page(mut self, page: u64) -> Self {
        self.set_page(page);
        self
    }
}

impl<F, K, const N: usize> ListCriteria<F, K, N>
where
    F: ListFilter,
{
    /// Applies `filter`, replacing a previously applied filter of the same kind.
    pub fn add(&mut self, filter: F) -> &mut Self {
        let tag = filter.tag() as MaxFilterCountType;

        if tag & self.applied == 0 {
            self.applied |= tag;
            self.filters.push(filter);
        } else if let Some(existing) = self
            .filters
            .iter_mut()
            .find(|f| f.tag() as MaxFilterCountType == tag)
        {
            *existing = filter;
        }

        self
    }

    pub fn with(mut self, filter: F) -> Self {
        self.add(filter);
        self
    }

    pub fn remove(&mut self, tag: Tag) -> Option<F> {
        let tag = tag as MaxFilterCountType;
        if tag & self.applied == 0 {
            return None;
        }
        self.applied &= !tag;
        let index = self
            .filters
            .iter()
            .position(|f| f.tag() as MaxFilterCountType == tag)?;
        Some(self.filters.remove(index))
    }

    pub fn matches(&self, item: &F::Item) -> bool {
        self.filters.iter().all(|f| f.matches(item))
    }
}

impl<F, K, const N: usize> ListCriteria<F, K, N>
where
    F: ListFilter,
    K: SortKey<F::Item>,
{
    pub fn sort_key(&self) -> Option<&K> {
        self.sort.as_ref().map(|s| &s.key)
    }
}
