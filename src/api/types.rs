//! Shared types for the HTTP layer.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::pipeline::VerificationPipeline;

/// Shared context for all routes.
///
/// The semaphore caps concurrent model calls; it is the only state shared
/// between uploads.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<VerificationPipeline>,
    pub limiter: Arc<Semaphore>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(
        pipeline: Arc<VerificationPipeline>,
        max_concurrent_requests: usize,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            pipeline,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            max_upload_bytes,
        }
    }

    pub fn from_config(pipeline: Arc<VerificationPipeline>, config: &AppConfig) -> Self {
        Self::new(
            pipeline,
            config.max_concurrent_requests,
            config.max_upload_bytes,
        )
    }
}
