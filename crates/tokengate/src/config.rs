//! Worker process configuration.

use std::time::Duration;

/// Identity and cadence of one worker process.
///
/// `process_name`/`server_name` identify this consumer in the control
/// database's liveness records; supervisors alert on a heartbeat that
/// stops advancing.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Logical name of this worker kind.
    pub process_name: String,

    /// The host this instance runs on.
    pub server_name: String,

    /// How often a liveness record is written, independent of message
    /// traffic. Default: 10 seconds.
    pub heartbeat_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            process_name: "tokengate-session".to_string(),
            server_name: "localhost".to_string(),
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}
