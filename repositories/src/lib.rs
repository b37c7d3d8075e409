use error_stack::Report;

pub mod http;
pub mod memory;

pub type RepoInitResult<T> = Result<T, Report<RepoInitErr>>;

#[derive(Debug, thiserror::Error)]
#[error("failed to initialize repository")]
pub struct RepoInitErr;
