use error_stack::Report;

#[derive(Debug, thiserror::Error)]
#[error("the ratings client exited with an error")]
pub struct AppError;

pub type AppResult<T> = Result<T, Report<AppError>>;
