//! S3-compatible uploader (Cloudflare R2, MinIO, AWS S3).

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;
use crate::retry::with_backoff;
use crate::uploader::{ObjectUploader, UploadError};

/// R2 ignores the region but the SDK requires one.
const REGION: &str = "auto";

/// Content type of uploaded reels.
const CONTENT_TYPE: &str = "video/mp4";

/// Client and addressing details, present only when the configuration is
/// complete.
struct Target {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

pub struct S3Uploader {
    config: StorageConfig,
    target: Option<Target>,
}

impl S3Uploader {
    /// Build an uploader. An incomplete configuration is accepted; every
    /// upload then fails with [`UploadError::NotConfigured`].
    pub fn new(config: StorageConfig) -> Self {
        let target = match (
            &config.endpoint,
            &config.access_key_id,
            &config.secret_access_key,
            &config.bucket,
            &config.public_base_url,
        ) {
            (Some(endpoint), Some(key), Some(secret), Some(bucket), Some(public)) => {
                let credentials = Credentials::new(key, secret, None, None, "reels-env");
                let s3_config = aws_sdk_s3::config::Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(REGION))
                    .endpoint_url(endpoint)
                    .credentials_provider(credentials)
                    .force_path_style(true)
                    // Retries are bounded by `StorageConfig::retry` alone.
                    .retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled())
                    .build();
                Some(Target {
                    client: aws_sdk_s3::Client::from_conf(s3_config),
                    bucket: bucket.clone(),
                    public_base_url: public.clone(),
                })
            }
            _ => {
                tracing::warn!(
                    missing = %config.missing_fields().join(", "),
                    "Object storage is not fully configured; uploads will fail",
                );
                None
            }
        };

        Self { config, target }
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    async fn put(&self, target: &Target, key: &str, body: Bytes) -> Result<(), UploadError> {
        target
            .client
            .put_object()
            .bucket(&target.bucket)
            .key(key)
            .content_type(CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(classify_sdk_error)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectUploader for S3Uploader {
    async fn upload(&self, local_path: &Path, object_name: &str) -> Result<String, UploadError> {
        let target = self.target.as_ref().ok_or_else(|| {
            UploadError::NotConfigured(self.config.missing_fields().join(", "))
        })?;

        let body = tokio::fs::read(local_path)
            .await
            .map(Bytes::from)
            .map_err(|source| UploadError::Read {
                path: local_path.to_string_lossy().to_string(),
                source,
            })?;

        let key = self.config.object_key(object_name);
        let size_bytes = body.len();

        with_backoff(&self.config.retry, |attempt| {
            let body = body.clone();
            let key = key.as_str();
            async move {
                tracing::debug!(key, attempt, size_bytes, "Uploading object");
                self.put(target, key, body).await
            }
        })
        .await?;

        tracing::info!(bucket = %target.bucket, key = %key, size_bytes, "Object uploaded");

        Ok(public_url(&target.public_base_url, &key))
    }
}

/// Public address of an object: the configured base URL plus the key.
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{key}", base_url.trim_end_matches('/'))
}

/// Map an SDK failure onto [`UploadError`], keeping transient network
/// failures distinguishable from responses the store sent back.
fn classify_sdk_error<E>(err: SdkError<E>) -> UploadError
where
    E: std::error::Error + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            UploadError::Network(message)
        }
        SdkError::ServiceError(ctx) => UploadError::Rejected {
            status: ctx.raw().status().as_u16(),
            message,
        },
        _ => UploadError::Other(message),
    }
}
