//! Response normalization.
//!
//! Shapes an arbitrary backend payload into a [`PageResult`]. Callers supply
//! a [`ResponseMapper`], usually through [`map_fn`] or [`map_async`];
//! [`JsonFieldMapper`] covers payloads that already carry the three fields
//! somewhere in their JSON.

use std::fmt::Display;
use std::future::Future;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::PageResult;

use super::error::LoaderError;

#[async_trait]
pub trait ResponseMapper<T>: Send + Sync {
    async fn map(&self, raw: Value) -> Result<PageResult<T>, LoaderError>;
}

/// Synchronous closure mapper. See [`map_fn`].
pub struct FnMapper<F>(F);

#[async_trait]
impl<T, F, E> ResponseMapper<T> for FnMapper<F>
where
    T: Send,
    F: Fn(Value) -> Result<PageResult<T>, E> + Send + Sync,
    E: Display,
{
    async fn map(&self, raw: Value) -> Result<PageResult<T>, LoaderError> {
        (self.0)(raw).map_err(|err| LoaderError::mapping(err.to_string()))
    }
}

/// Asynchronous closure mapper. See [`map_async`].
pub struct AsyncFnMapper<F>(F);

#[async_trait]
impl<T, F, Fut, E> ResponseMapper<T> for AsyncFnMapper<F>
where
    T: Send,
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResult<T>, E>> + Send,
    E: Display,
{
    async fn map(&self, raw: Value) -> Result<PageResult<T>, LoaderError> {
        (self.0)(raw)
            .await
            .map_err(|err| LoaderError::mapping(err.to_string()))
    }
}

pub fn map_fn<T, F, E>(f: F) -> FnMapper<F>
where
    F: Fn(Value) -> Result<PageResult<T>, E> + Send + Sync,
{
    FnMapper(f)
}

pub fn map_async<T, F, Fut, E>(f: F) -> AsyncFnMapper<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResult<T>, E>> + Send,
{
    AsyncFnMapper(f)
}

const DEFAULT_ITEMS_POINTER: &str = "/items";
const DEFAULT_PAGE_POINTER: &str = "/page";
const DEFAULT_TOTAL_PAGES_POINTER: &str = "/totalPages";

/// Mapper that reads the three result fields through JSON pointers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonFieldMapper {
    pub items_pointer: String,
    pub page_pointer: String,
    pub total_pages_pointer: String,
}

impl Default for JsonFieldMapper {
    fn default() -> Self {
        Self {
            items_pointer: DEFAULT_ITEMS_POINTER.to_string(),
            page_pointer: DEFAULT_PAGE_POINTER.to_string(),
            total_pages_pointer: DEFAULT_TOTAL_PAGES_POINTER.to_string(),
        }
    }
}

impl JsonFieldMapper {
    pub fn extract(&self, raw: &Value) -> Result<PageResult<Value>, LoaderError> {
        let items = match lookup(raw, &self.items_pointer)? {
            Value::Array(items) => items.clone(),
            other => {
                return Err(LoaderError::mapping(format!(
                    "`{}` is not an array (found {})",
                    self.items_pointer,
                    type_name(other)
                )));
            }
        };
        let page = lookup_u32(raw, &self.page_pointer)?;
        let total_pages = lookup_u32(raw, &self.total_pages_pointer)?;
        Ok(PageResult::new(items, page, total_pages))
    }
}

#[async_trait]
impl ResponseMapper<Value> for JsonFieldMapper {
    async fn map(&self, raw: Value) -> Result<PageResult<Value>, LoaderError> {
        self.extract(&raw)
    }
}

fn lookup<'a>(raw: &'a Value, pointer: &str) -> Result<&'a Value, LoaderError> {
    raw.pointer(pointer)
        .ok_or_else(|| LoaderError::mapping(format!("missing field `{pointer}`")))
}

fn lookup_u32(raw: &Value, pointer: &str) -> Result<u32, LoaderError> {
    let value = lookup(raw, pointer)?;
    value
        .as_u64()
        .and_then(|number| u32::try_from(number).ok())
        .ok_or_else(|| {
            LoaderError::mapping(format!(
                "`{pointer}` is not a page number (found {})",
                type_name(value)
            ))
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn sync_closure_maps_payload() {
        let mapper = map_fn(|raw: Value| -> Result<PageResult<String>, String> {
            let names = raw["data"]
                .as_array()
                .ok_or("no data")?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            Ok(PageResult::new(names, 1, 1))
        });

        let result = mapper
            .map(json!({ "data": ["a", "b"] }))
            .await
            .expect("mapped");
        assert_eq!(result.items, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn closure_error_becomes_mapping_error() {
        let mapper =
            map_fn(|_raw: Value| Err::<PageResult<u8>, _>("unexpected payload shape"));
        let err = mapper.map(json!({})).await.expect_err("mapping fails");
        assert!(matches!(err, LoaderError::Mapping { .. }));
        assert!(err.to_string().contains("unexpected payload shape"));
    }

    #[tokio::test]
    async fn async_closure_maps_payload() {
        let mapper = map_async(|raw: Value| async move {
            let total = raw["pages"].as_u64().unwrap_or(0) as u32;
            Ok::<_, String>(PageResult::new(vec![raw["id"].clone()], 1, total))
        });
        let result = mapper
            .map(json!({ "id": 9, "pages": 4 }))
            .await
            .expect("mapped");
        assert_eq!(result.total_pages, 4);
        assert_eq!(result.items, vec![json!(9)]);
    }

    #[test]
    fn field_mapper_reads_default_pointers() {
        let mapper = JsonFieldMapper::default();
        let result = mapper
            .extract(&json!({ "items": [1, 2], "page": 3, "totalPages": 7 }))
            .expect("mapped");
        assert_eq!(result, PageResult::new(vec![json!(1), json!(2)], 3, 7));
    }

    #[test]
    fn field_mapper_follows_nested_pointers() {
        let mapper = JsonFieldMapper {
            items_pointer: "/data/results".to_string(),
            page_pointer: "/meta/page".to_string(),
            total_pages_pointer: "/meta/pages".to_string(),
        };
        let result = mapper
            .extract(&json!({
                "data": { "results": [{ "id": 1 }] },
                "meta": { "page": 1, "pages": 2 }
            }))
            .expect("mapped");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total_pages, 2);
    }

    #[test]
    fn field_mapper_rejects_missing_and_mistyped_fields() {
        let mapper = JsonFieldMapper::default();

        let missing = mapper
            .extract(&json!({ "items": [], "page": 1 }))
            .expect_err("missing totalPages");
        assert!(missing.to_string().contains("/totalPages"));

        let mistyped = mapper
            .extract(&json!({ "items": {}, "page": 1, "totalPages": 1 }))
            .expect_err("items not an array");
        assert!(mistyped.to_string().contains("object"));

        let negative = mapper
            .extract(&json!({ "items": [], "page": -1, "totalPages": 1 }))
            .expect_err("negative page");
        assert!(matches!(negative, LoaderError::Mapping { .. }));
    }
}
