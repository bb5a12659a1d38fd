//! Response resolver.
//!
//! Executes the network side of a page load. A target is either a URL template
//! with `{query}`, `{page}` and `{pageSize}` placeholders, or a caller-supplied
//! [`PageSource`]. Resolution yields a raw JSON payload; shaping it into a
//! [`PageResult`](crate::domain::PageResult) is the mapper's job.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use url::form_urlencoded;

use crate::domain::PageRequest;

use super::error::LoaderError;

const QUERY_TOKEN: &str = "{query}";
const PAGE_TOKEN: &str = "{page}";
const PAGE_SIZE_TOKEN: &str = "{pageSize}";

/// What a [`PageSource`] hands back.
#[derive(Debug)]
pub enum RawResponse {
    /// A transport response whose body is parsed as JSON.
    Http(Response),
    /// An already-structured payload, used as-is.
    Value(Value),
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Response> for RawResponse {
    fn from(response: Response) -> Self {
        Self::Http(response)
    }
}

/// Caller-supplied asynchronous backend.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn resolve(&self, request: &PageRequest) -> Result<RawResponse, LoaderError>;
}

/// [`PageSource`] backed by an async closure. See [`source_fn`].
pub struct FnSource<F>(F);

#[async_trait]
impl<F, Fut> PageSource for FnSource<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse, LoaderError>> + Send,
{
    async fn resolve(&self, request: &PageRequest) -> Result<RawResponse, LoaderError> {
        (self.0)(request.clone()).await
    }
}

/// Wrap an async closure as a [`PageSource`].
pub fn source_fn<F, Fut>(f: F) -> FnSource<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawResponse, LoaderError>> + Send,
{
    FnSource(f)
}

/// Where pages come from.
#[derive(Clone)]
pub enum Target {
    Template(String),
    Source(Arc<dyn PageSource>),
}

impl Target {
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }

    pub fn source(source: impl PageSource + 'static) -> Self {
        Self::Source(Arc::new(source))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Source(_) => f.write_str("Source(..)"),
        }
    }
}

/// Executes page requests against a [`Target`].
pub struct ResponseResolver {
    target: Target,
    client: Client,
}

impl ResponseResolver {
    pub fn new(target: Target, client: Client) -> Self {
        Self { target, client }
    }

    pub async fn resolve(&self, request: &PageRequest) -> Result<Value, LoaderError> {
        match &self.target {
            Target::Template(template) => {
                let expanded = expand_template(template, request);
                let url = Url::parse(&expanded)
                    .map_err(|err| LoaderError::invalid_url(&expanded, err.to_string()))?;
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoaderError::Status {
                        status: status.as_u16(),
                    });
                }
                read_json(response).await
            }
            Target::Source(source) => match source.resolve(request).await? {
                RawResponse::Http(response) => read_json(response).await,
                RawResponse::Value(value) => Ok(value),
            },
        }
    }
}

async fn read_json(response: Response) -> Result<Value, LoaderError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| LoaderError::decode(err.to_string()))
}

/// Substitute the first occurrence of each placeholder in `template`.
pub fn expand_template(template: &str, request: &PageRequest) -> String {
    template
        .replacen(QUERY_TOKEN, &encode_component(&request.query), 1)
        .replacen(PAGE_TOKEN, &request.page.to_string(), 1)
        .replacen(PAGE_SIZE_TOKEN, &request.page_size.to_string(), 1)
}

/// Percent-encode `value` for use inside a URL component, spaces as `%20`.
pub fn encode_component(value: &str) -> String {
    // `+` in the input is already escaped as `%2B`, so every `+` left is a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
