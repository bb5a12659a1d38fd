#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use remote_pager::{
    JsonFieldMapper, LoaderError, LoaderOptions, PageRequest, PageSource, RawResponse,
    RemoteLoader, Target,
};
use serde_json::{Value, json};

/// How the scripted backend answers.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Pages { total_pages: u32 },
    Status(u16),
    Malformed,
}

/// In-memory backend that records every request it receives.
///
/// Each request sleeps for the configured latency before answering, so an
/// aborted request never counts as completed.
#[derive(Clone)]
pub struct ScriptedSource {
    calls: Arc<Mutex<Vec<PageRequest>>>,
    completed: Arc<AtomicUsize>,
    latency: Duration,
    per_query_latency: Arc<HashMap<String, Duration>>,
    per_query_total: Arc<HashMap<String, u32>>,
    reply: Reply,
}

impl ScriptedSource {
    pub fn new(reply: Reply) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(AtomicUsize::new(0)),
            latency: Duration::from_millis(10),
            per_query_latency: Arc::new(HashMap::new()),
            per_query_total: Arc::new(HashMap::new()),
            reply,
        }
    }

    pub fn pages(total_pages: u32) -> Self {
        Self::new(Reply::Pages { total_pages })
    }

    pub fn with_query_latency(mut self, query: &str, latency: Duration) -> Self {
        let mut map = (*self.per_query_latency).clone();
        map.insert(query.to_string(), latency);
        self.per_query_latency = Arc::new(map);
        self
    }

    /// Report `total_pages` for `query` instead of the scripted default.
    pub fn with_query_total(mut self, query: &str, total_pages: u32) -> Self {
        let mut map = (*self.per_query_total).clone();
        map.insert(query.to_string(), total_pages);
        self.per_query_total = Arc::new(map);
        self
    }

    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

pub fn item_label(query: &str, page: u32, index: u32) -> Value {
    json!(format!("{query}-{page}-{index}"))
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn resolve(&self, request: &PageRequest) -> Result<RawResponse, LoaderError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        let latency = self
            .per_query_latency
            .get(&request.query)
            .copied()
            .unwrap_or(self.latency);
        tokio::time::sleep(latency).await;
        self.completed.fetch_add(1, Ordering::SeqCst);

        match self.reply {
            Reply::Pages { total_pages } => {
                let total_pages = self
                    .per_query_total
                    .get(&request.query)
                    .copied()
                    .unwrap_or(total_pages);
                let items: Vec<Value> = (0..2)
                    .map(|index| item_label(&request.query, request.page, index))
                    .collect();
                Ok(json!({
                    "items": items,
                    "page": request.page,
                    "totalPages": total_pages,
                })
                .into())
            }
            Reply::Status(status) => Err(LoaderError::Status { status }),
            Reply::Malformed => Ok(json!({ "unexpected": true }).into()),
        }
    }
}

/// Options wired to `source` with the JSON field mapper.
pub fn options(source: &ScriptedSource) -> LoaderOptions<Value> {
    LoaderOptions::new(Target::source(source.clone()), JsonFieldMapper::default())
}

pub fn loader(source: &ScriptedSource) -> RemoteLoader<Value> {
    RemoteLoader::new(options(source))
}

/// Records every error handed to `on_error`.
#[derive(Clone, Default)]
pub struct ErrorLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn attach(&self, options: LoaderOptions<Value>) -> LoaderOptions<Value> {
        let messages = Arc::clone(&self.messages);
        options.with_on_error(move |err| {
            messages.lock().expect("errors lock").push(err.to_string());
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("errors lock").clone()
    }
}
