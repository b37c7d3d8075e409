use error_stack::Report;

pub type RepoResult<T> = Result<T, Report<RatingRepoError>>;
pub type OptRepoResult<T> = Result<Option<T>, Report<RatingRepoError>>;

#[derive(Debug, thiserror::Error)]
pub enum RatingRepoError {
    #[error("failed to get rating")]
    Get,
    #[error("failed to list ratings")]
    List,
    #[error("failed to list store ratings")]
    ListForStore,
    #[error("failed to create rating")]
    Create,
    #[error("failed to patch rating")]
    Patch,
    #[error("failed to delete rating")]
    Delete,
    #[error("failed to like rating")]
    Like,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RatingValidationError {
    #[error("score must be between {min} and {max}, got {0}", min = crate::model::MIN_SCORE, max = crate::model::MAX_SCORE)]
    ScoreOutOfRange(u8),
    #[error("a rating needs a user")]
    MissingUser,
    #[error("a rating can have at most {max} images", max = crate::model::MAX_IMAGES)]
    TooManyImages,
}
