//! Queue service factory for creating service instances from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{http::HttpQueueService, QueueService};
use crate::config::Config;

/// Create the remote queue service described by `config`.
///
/// # Errors
/// Returns error if:
/// - The configuration fails validation
/// - The HTTP client cannot be constructed
pub fn create_service(config: &Config) -> Result<Arc<dyn QueueService>> {
    config.validate()?;
    let service = HttpQueueService::new(&config.endpoints, &config.http).context("Failed to build HTTP queue client")?;
    Ok(Arc::new(service))
}
