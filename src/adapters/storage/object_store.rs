//! S3-compatible object store backend.
//!
//! Both production backends speak the S3 API: AWS S3 natively, and Google
//! Cloud Storage through its interoperability endpoint. Objects are
//! written world-readable with a short CDN cache lifetime; the CDN in
//! front of the bucket re-serves them with its own longer policy.

use super::{OBJECT_CACHE_CONTROL, OBJECT_EXPIRY_SECS};
use crate::infra::error::{StubError, StubResult};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

const GCS_INTEROP_ENDPOINT: &str = "https://storage.googleapis.com";

pub struct ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl ObjectStorage {
    /// Backend for a native S3 bucket, configured from the ambient AWS
    /// environment.
    pub async fn new_s3(bucket: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.to_string(),
        }
    }

    /// Backend for a GCS bucket via the S3 interoperability endpoint; HMAC
    /// credentials come from the same ambient environment.
    pub async fn new_gcs(bucket: &str) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let config = aws_sdk_s3::config::Builder::from(&base)
            .endpoint_url(GCS_INTEROP_ENDPOINT)
            .force_path_style(true)
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: bucket.to_string(),
        }
    }

    /// Whether `key` exists and was written recently enough to reuse.
    pub async fn exists(&self, key: &str) -> bool {
        let head = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(head) => head,
            Err(_) => return false,
        };

        let Some(last_modified) = head.last_modified() else {
            log::warn!("head object returned no last-modified key={key}");
            return false;
        };

        let age = aws_sdk_s3::primitives::DateTime::from(std::time::SystemTime::now()).secs()
            - last_modified.secs();
        age >= 0 && (age as u64) < OBJECT_EXPIRY_SECS
    }

    pub async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> StubResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(OBJECT_CACHE_CONTROL)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StubError::Storage(format!("put {key}: {e}")))?;

        log::info!(
            "wrote stub to object store key={key} bucket={} content_type={content_type}",
            self.bucket
        );
        Ok(())
    }
}
