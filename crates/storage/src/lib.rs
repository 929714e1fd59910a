//! Object storage uploader.
//!
//! Pushes rendered reels to an S3-compatible bucket under a fixed
//! namespace and derives their public URL from a configured base.

pub mod config;
pub mod retry;
pub mod s3;
pub mod uploader;

pub use config::StorageConfig;
pub use s3::S3Uploader;
pub use uploader::{ObjectUploader, UploadError};
