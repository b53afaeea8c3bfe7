//! Minimal S3 GetObject client over reqwest

mod credentials;
mod signing;

pub use credentials::{CredentialSource, Credentials};

use crate::environment::{EnvStore, MemoryEnv};
use crate::staging::store::{ObjectStore, ObjectStoreError, ObjectStream};
use futures::StreamExt;
use reqwest::Url;
use tokio::sync::OnceCell;

const DEFAULT_REGION: &str = "us-east-1";

/// S3 client reading objects with SigV4-signed GET requests
#[derive(Debug)]
pub struct S3Client {
    client: reqwest::Client,
    region: String,
    /// Custom endpoint (path-style addressing); AWS virtual-hosted style otherwise
    endpoint: Option<Url>,
    source: CredentialSource,
    credentials: OnceCell<Option<Credentials>>,
}

impl S3Client {
    /// Configure from the process environment
    pub fn from_env() -> Result<Self, ObjectStoreError> {
        Self::from_env_store(&MemoryEnv::from_process())
    }

    /// Configure from `AWS_*` variables in `env`
    pub fn from_env_store<E: EnvStore + ?Sized>(env: &E) -> Result<Self, ObjectStoreError> {
        let region = env
            .get_non_empty("AWS_REGION")
            .or_else(|| env.get_non_empty("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let endpoint = env
            .get_non_empty("AWS_ENDPOINT_URL_S3")
            .or_else(|| env.get_non_empty("AWS_ENDPOINT_URL"))
            .map(|raw| Url::parse(&raw).map_err(|_| ObjectStoreError::InvalidEndpoint(raw)))
            .transpose()?;

        let source = CredentialSource::from_env(env)?;
        log::debug!(
            "S3 client: region={} endpoint={:?} credentials={}",
            region,
            endpoint.as_ref().map(Url::as_str),
            match &source {
                CredentialSource::Static(_) => "static",
                CredentialSource::Container { .. } => "container",
                CredentialSource::Anonymous => "anonymous",
            }
        );

        Ok(Self {
            client: reqwest::Client::new(),
            region,
            endpoint,
            source,
            credentials: OnceCell::new(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// URL of `bucket/key`. Buckets that are not a single DNS label fall
    /// back to path-style so the wildcard certificate still matches.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, ObjectStoreError> {
        let path = signing::uri_encode_path(key);
        let raw = match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.as_str().trim_end_matches('/'),
                bucket,
                path
            ),
            None if is_virtual_host_bucket(bucket) => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, self.region, path
            ),
            None => format!(
                "https://s3.{}.amazonaws.com/{}/{}",
                self.region, bucket, path
            ),
        };
        Url::parse(&raw).map_err(|_| ObjectStoreError::InvalidEndpoint(raw))
    }

    async fn credentials(&self) -> Result<Option<&Credentials>, ObjectStoreError> {
        let credentials = self
            .credentials
            .get_or_try_init(|| self.source.resolve(&self.client))
            .await?;
        Ok(credentials.as_ref())
    }
}

/// Whether `bucket` can be used as the leftmost label of `*.s3.<region>.amazonaws.com`
fn is_virtual_host_bucket(bucket: &str) -> bool {
    let bytes = bucket.as_bytes();
    (3..=63).contains(&bytes.len())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
}

/// `Host` header value reqwest will send for `url`
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[async_trait::async_trait]
impl ObjectStore for S3Client {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, ObjectStoreError> {
        let url = self.object_url(bucket, key)?;
        let mut request = self.client.get(url.clone());

        if let Some(credentials) = self.credentials().await? {
            let host = host_header(&url)
                .ok_or_else(|| ObjectStoreError::InvalidEndpoint(url.to_string()))?;
            let headers = signing::sign_get(
                &host,
                url.path(),
                &self.region,
                credentials,
                chrono::Utc::now(),
            );
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ObjectStoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ObjectStoreError::from))
            .boxed())
    }
}
