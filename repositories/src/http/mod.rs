//! Repositories backed by the remote JSON API.
//!
//! Every response body is wrapped as `{ "data": ..., "pagination": ... }`. Failures carry a
//! [`RemoteMessage`] taken from the error body's `message` or `error` field, or the status line
//! when the body has neither.
use crate::{RepoInitErr, RepoInitResult};
use engine::error::RemoteMessage;
use engine::{Listing, Pagination};
use error_stack::{IntoReport, Report, ResultExt};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod categories;
pub mod ratings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to reach the remote API")]
    Transport,
    #[error("the remote API answered {0}")]
    Status(StatusCode),
    #[error("failed to decode the remote API response")]
    Decode,
}

type HttpResult<T> = Result<T, Report<HttpError>>;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Shared connection to the remote API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> RepoInitResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .change_context(RepoInitErr)
            .attach("failed to build http client")?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> RepoInitResult<Self> {
        let parsed = Url::parse(base_url)
            .change_context(RepoInitErr)
            .attach_with(|| format!("'{base_url}' is not a valid url"))?;
        if parsed.cannot_be_a_base() {
            return Err(RepoInitErr.into_report())
                .attach_with(|| format!("'{base_url}' cannot be used as a base url"));
        }

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, "calling remote API");
        self.client.request(method, url)
    }

    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        pagination: Pagination,
        query: &[(&str, &str)],
    ) -> HttpResult<Listing<T>> {
        let request = self
            .request(Method::GET, path)
            .query(&page_query(pagination))
            .query(query);
        decode(send(request).await?).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> HttpResult<Option<T>> {
        match send_opt(self.request(Method::GET, path)).await? {
            Some(response) => data_of(response).await.map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> HttpResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = send(self.request(Method::POST, path).json(body)).await?;
        data_of(response).await
    }

    /// A POST without a body against an existing entity, such as a like.
    pub(crate) async fn post_action<T: DeserializeOwned>(&self, path: &str) -> HttpResult<Option<T>> {
        match send_opt(self.request(Method::POST, path)).await? {
            Some(response) => data_of(response).await.map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn patch<T, B>(&self, path: &str, body: &B) -> HttpResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match send_opt(self.request(Method::PATCH, path).json(body)).await? {
            Some(response) => data_of(response).await.map(Some),
            None => Ok(None),
        }
    }

    /// Whatever the API answers on success is ignored.
    pub(crate) async fn delete(&self, path: &str) -> HttpResult<Option<()>> {
        Ok(send_opt(self.request(Method::DELETE, path)).await?.map(|_| ()))
    }
}

fn page_query(pagination: Pagination) -> Vec<(&'static str, u64)> {
    let mut query = vec![("page", pagination.page())];
    if let Some(page_size) = pagination.page_size {
        query.push(("page_size", page_size.max(1)));
    }
    query
}

/// Treats every non 2xx answer as a failure.
async fn send(request: RequestBuilder) -> HttpResult<Response> {
    let response = request.send().await.change_context(HttpError::Transport)?;
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(failure(response).await)
    }
}

/// Like [`send`], but a 404 means the entity does not exist.
async fn send_opt(request: RequestBuilder) -> HttpResult<Option<Response>> {
    let response = request.send().await.change_context(HttpError::Transport)?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => Ok(Some(response)),
        _ => Err(failure(response).await),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> HttpResult<T> {
    response.json().await.change_context(HttpError::Decode)
}

async fn data_of<T: DeserializeOwned>(response: Response) -> HttpResult<T> {
    decode::<Envelope<T>>(response)
        .await
        .map(|envelope| envelope.data)
}

async fn failure(response: Response) -> Report<HttpError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| status.to_string());
    debug!(%status, %message, "remote API call failed");
    HttpError::Status(status)
        .into_report()
        .attach(RemoteMessage(message))
}

/// The `message` field of a JSON error body, falling back to `error`.
fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    ["message", "error"]
        .into_iter()
        .filter_map(|field| value.get(field).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}
