use error_stack::Report;

pub type RepoResult<T> = Result<T, Report<CategoryRepoError>>;
pub type OptRepoResult<T> = Result<Option<T>, Report<CategoryRepoError>>;

#[derive(Debug, thiserror::Error)]
pub enum CategoryRepoError {
    #[error("failed to get category")]
    Get,
    #[error("failed to list categories")]
    List,
    #[error("failed to search categories")]
    Search,
    #[error("failed to create category")]
    Create,
    #[error("failed to patch category")]
    Patch,
    #[error("failed to delete category")]
    Delete,
}

/// Reasons a category is refused before it is sent to the remote API.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    #[error("category name cannot be empty")]
    MissingName,
    #[error("a category cannot be its own parent")]
    OwnParent,
}
