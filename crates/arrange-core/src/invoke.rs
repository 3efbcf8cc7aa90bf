//! Timed backend invocation.

use std::future::Future;
use std::sync::Arc;

use arrange_proto::error::CommandError;
use arrange_proto::protocol::Operation;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::metrics::PerformanceStore;

/// Wraps every backend call: times it, records a sample whether it
/// succeeded or not, and hands the result back untouched.
#[derive(Clone)]
pub struct Invoker {
    metrics: Arc<RwLock<PerformanceStore>>,
}

impl Invoker {
    pub fn new(window: usize) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(PerformanceStore::new(window))),
        }
    }

    pub fn metrics(&self) -> Arc<RwLock<PerformanceStore>> {
        Arc::clone(&self.metrics)
    }

    pub async fn invoke<T, F>(&self, operation: Operation, call: F) -> Result<T, CommandError>
    where
        F: Future<Output = Result<T, CommandError>>,
    {
        let start = Instant::now();
        let result = call.await;
        let elapsed = start.elapsed();

        self.metrics.write().await.record(operation, elapsed);

        match &result {
            Ok(_) => debug!("invoke: {} ok in {:?}", operation, elapsed),
            Err(e) => warn!("invoke: {} failed in {:?}: {}", operation, elapsed, e),
        }
        result
    }
}
