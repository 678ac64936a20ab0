//! Synthetic workload for `request_processing_seconds`.
//!
//! Sleeps a random fraction of a second, timed by the summary, over and
//! over until shutdown.

use std::sync::Arc;
use std::time::Duration;

use ingress_metrics::LatencySummary;
use tokio::sync::watch;
use tracing::{debug, info};

pub async fn run(summary: Arc<LatencySummary>, mut shutdown: watch::Receiver<bool>) {
    info!("demo workload started");
    loop {
        let seconds = rand::random::<f64>();
        tokio::select! {
            _ = summary.time(process_request(seconds)) => {}
            _ = shutdown.changed() => {
                debug!(requests = summary.count(), "demo workload stopping");
                return;
            }
        }
    }
}

async fn process_request(seconds: f64) {
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}
