//! In-process repositories, for running without the remote API and for tests.
use engine::{Listing, PageInfo, Pagination};

pub mod categories;
pub mod ratings;

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Rows of one entity kind plus the id the next created row gets.
#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
    next_id: u64,
}

impl<T> Table<T> {
    fn new(rows: Vec<T>, id_of: impl Fn(&T) -> u64) -> Self {
        let next_id = rows.iter().map(id_of).max().unwrap_or_default() + 1;
        Self { rows, next_id }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Cuts the page `pagination` asks for out of `rows`, the way the remote API pages.
fn page_of<T: Clone>(rows: Vec<&T>, pagination: Pagination) -> Listing<T> {
    let page = pagination.page();
    let page_size = pagination.page_size_or(DEFAULT_PAGE_SIZE);
    let total = rows.len() as u64;
    let start = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
    let take = usize::try_from(page_size).unwrap_or(usize::MAX);

    Listing::new(
        rows.into_iter().skip(start).take(take).cloned().collect(),
        Some(PageInfo {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }),
    )
}
