//! Object storage configuration.

use crate::retry::RetryConfig;

/// Default namespace for uploaded reels.
pub const DEFAULT_KEY_PREFIX: &str = "reels";

/// Settings for an S3-compatible bucket (Cloudflare R2 by default).
///
/// Every connection field is optional so the service can start without
/// storage credentials; uploads then fail with
/// [`UploadError::NotConfigured`](crate::UploadError::NotConfigured).
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// S3 API endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`.
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    /// Public base URL objects are served from. No trailing slash.
    pub public_base_url: Option<String>,
    /// Namespace prepended to every object key.
    pub key_prefix: String,
    pub retry: RetryConfig,
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default | Description                           |
    /// |------------------------|---------|---------------------------------------|
    /// | `STORAGE_ENDPOINT`     | --      | explicit S3 endpoint                  |
    /// | `R2_ACCOUNT_ID`        | --      | derives the R2 endpoint if no override |
    /// | `R2_ACCESS_KEY_ID`     | --      | access key                            |
    /// | `R2_SECRET_ACCESS_KEY` | --      | secret key                            |
    /// | `R2_BUCKET_NAME`       | --      | bucket                                |
    /// | `R2_PUBLIC_URL`        | --      | public base URL                       |
    /// | `STORAGE_KEY_PREFIX`   | `reels` | object key namespace                  |
    /// | `UPLOAD_MAX_ATTEMPTS`  | `3`     | attempts per upload                   |
    pub fn from_env() -> Self {
        let endpoint = non_empty_var("STORAGE_ENDPOINT").or_else(|| {
            non_empty_var("R2_ACCOUNT_ID")
                .map(|account| format!("https://{account}.r2.cloudflarestorage.com"))
        });

        let key_prefix = non_empty_var("STORAGE_KEY_PREFIX")
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());

        let mut retry = RetryConfig::default();
        if let Some(attempts) = non_empty_var("UPLOAD_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            retry.max_attempts = attempts;
        }

        Self {
            endpoint,
            access_key_id: non_empty_var("R2_ACCESS_KEY_ID"),
            secret_access_key: non_empty_var("R2_SECRET_ACCESS_KEY"),
            bucket: non_empty_var("R2_BUCKET_NAME"),
            public_base_url: non_empty_var("R2_PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            key_prefix: key_prefix.trim_matches('/').to_string(),
            retry,
        }
    }

    /// Names of the settings that are still missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("endpoint", self.endpoint.is_none()),
            ("access key", self.access_key_id.is_none()),
            ("secret key", self.secret_access_key.is_none()),
            ("bucket", self.bucket.is_none()),
            ("public URL", self.public_base_url.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Full object key for a file name: `<prefix>/<name>`.
    pub fn object_key(&self, name: &str) -> String {
        if self.key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.key_prefix)
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> StorageConfig {
        StorageConfig {
            endpoint: Some("https://acct.r2.cloudflarestorage.com".into()),
            access_key_id: Some("key".into()),
            secret_access_key: Some("secret".into()),
            bucket: Some("reels-bucket".into()),
            public_base_url: Some("https://cdn.example.com".into()),
            key_prefix: DEFAULT_KEY_PREFIX.into(),
            retry: RetryConfig::default(),
        }
    }

    #[test]
    fn complete_config_has_no_missing_fields() {
        assert!(complete().is_complete());
    }

    #[test]
    fn missing_credentials_are_reported() {
        let config = StorageConfig {
            access_key_id: None,
            secret_access_key: None,
            ..complete()
        };
        assert_eq!(config.missing_fields(), vec!["access key", "secret key"]);
        assert!(!config.is_complete());
    }

    #[test]
    fn default_config_misses_everything() {
        assert_eq!(StorageConfig::default().missing_fields().len(), 5);
    }

    #[test]
    fn object_key_is_namespaced() {
        assert_eq!(complete().object_key("abc.mp4"), "reels/abc.mp4");
    }

    #[test]
    fn empty_prefix_leaves_name_alone() {
        let config = StorageConfig {
            key_prefix: String::new(),
            ..complete()
        };
        assert_eq!(config.object_key("abc.mp4"), "abc.mp4");
    }
}
