use error_stack::Report;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// A message meant for whoever looks at the failed operation, usually taken from the
/// remote API's error body. Attached to repository errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMessage(pub String);

impl Display for RemoteMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The text shown for a failed operation: the innermost [`RemoteMessage`] if one was attached,
/// otherwise the report's own context.
pub fn display_message<C: Error + Send + Sync + 'static>(report: &Report<C>) -> String {
    report
        .downcast_ref::<RemoteMessage>()
        .map(ToString::to_string)
        .unwrap_or_else(|| report.current_context().to_string())
}

/// Turns a repository result into the form the request tracker stores.
pub fn user_message<T, C>(result: Result<T, Report<C>>) -> Result<T, String>
where
    C: Error + Send + Sync + 'static,
{
    result.map_err(|report| {
        debug!("remote call failed: {report:?}");
        display_message(&report)
    })
}

/// Like [`user_message`], treating a missing entity as a failure.
pub fn found<T, C>(result: Result<Option<T>, Report<C>>, what: impl Display) -> Result<T, String>
where
    C: Error + Send + Sync + 'static,
{
    user_message(result)?.ok_or_else(|| format!("{what} not found"))
}
