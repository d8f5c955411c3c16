use std::error::Error;

use unikernal_core::ServiceId;

/// Receives the session's lifecycle reports.
pub trait Observer: Send + Sync {
    fn log_info(&self, message: &str);
    fn log_error(&self, error: &dyn Error);
}

/// Reports through `tracing`, tagged with the service id.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    service_id: ServiceId,
}

impl TracingObserver {
    pub fn new(service_id: ServiceId) -> Self {
        Self { service_id }
    }
}

impl Observer for TracingObserver {
    fn log_info(&self, message: &str) {
        tracing::info!(service_id = %self.service_id, "{message}");
    }

    fn log_error(&self, error: &dyn Error) {
        tracing::error!(service_id = %self.service_id, "{error}");
    }
}
