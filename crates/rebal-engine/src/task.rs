use std::sync::Arc;
use std::time::Duration;

use pragma_common::services::{Service, ServiceRunner};

use crate::service::PerformanceService;

/// Daily performance computation as a long-running service.
pub struct PerformanceTask {
    service: Arc<PerformanceService>,
    interval: Duration,
}

impl PerformanceTask {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

    pub const fn new(service: Arc<PerformanceService>, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait::async_trait]
impl Service for PerformanceTask {
    async fn start<'a>(&mut self, mut runner: ServiceRunner<'a>) -> anyhow::Result<()> {
        let service = self.service.clone();
        let interval = self.interval;

        runner.spawn_loop(move |ctx| async move {
            ctx.run_until_cancelled(service.run_forever(interval)).await;
            anyhow::Ok(())
        });

        Ok(())
    }
}
