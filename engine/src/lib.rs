pub mod error;
pub mod handle;
pub mod list_criteria;
pub mod metrics;
mod pagination;
pub use pagination::{Listing, PageInfo, Pagination};
pub mod request;
pub mod selector;
pub mod store;
