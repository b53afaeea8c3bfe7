//! Object store abstraction used for staging

use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Stream of object body chunks
pub type ObjectStream = BoxStream<'static, Result<Vec<u8>, ObjectStoreError>>;

/// Read access to a bucket/key object store
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open the body of `bucket/key` as a byte stream
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, ObjectStoreError>;
}

/// Object store backed by a map of `(bucket, key)` to contents
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStore {
    objects: HashMap<(String, String), Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), body.into());
        self
    }

    /// `bucket/key` of every request made so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, ObjectStoreError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(format!("{}/{}", bucket, key));
        }

        let body = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or(ObjectStoreError::NotFound)?;

        // Two chunks to exercise streaming writes
        let split = body.len() / 2;
        let chunks = vec![Ok(body[..split].to_vec()), Ok(body[split..].to_vec())];
        Ok(stream::iter(chunks).boxed())
    }
}

/// Errors from object store operations
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("failed to load credentials: {0}")]
    Credentials(String),

    #[error("object not found")]
    NotFound,
}
