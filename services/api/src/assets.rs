//! Asset store holding uploaded project and profile images
//!
//! Uploads happen elsewhere; this service only destroys assets that belong
//! to deleted projects.

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, info};

/// Destroys stored assets by public id
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Assets kept as objects of one S3 bucket, keyed by public id
pub struct S3AssetStore {
    s3_client: Client,
    bucket_name: String,
}

impl S3AssetStore {
    pub fn new(s3_client: Client, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn destroy(&self, public_id: &str) -> Result<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(public_id)
            .send()
            .await?;

        info!("Deleted asset {} from bucket {}", public_id, self.bucket_name);
        Ok(())
    }
}

/// Used when no bucket is configured
#[derive(Debug, Default)]
pub struct NoopAssetStore;

#[async_trait]
impl AssetStore for NoopAssetStore {
    async fn destroy(&self, public_id: &str) -> Result<()> {
        debug!("No asset store configured, keeping {}", public_id);
        Ok(())
    }
}
