use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0 and the upload limit is positive
/// - Worker pool, batch limit and event buffer are positive
/// - Conversion timeout is positive
/// - Retention, sweep interval and any byte cap are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let checks: [(bool, &str); 9] = [
        (config.server.port == 0, "server.port cannot be 0"),
        (
            config.server.max_upload_bytes == 0,
            "server.max_upload_bytes cannot be 0",
        ),
        (
            config.batch.max_parallel_jobs == 0,
            "batch.max_parallel_jobs cannot be 0",
        ),
        (
            config.batch.max_files_per_batch == 0,
            "batch.max_files_per_batch cannot be 0",
        ),
        (config.batch.event_buffer == 0, "batch.event_buffer cannot be 0"),
        (
            config.converter.timeout_secs == 0,
            "converter.timeout_secs cannot be 0",
        ),
        (
            config.store.retention_secs == 0,
            "store.retention_secs cannot be 0",
        ),
        (
            config.store.sweep_interval_secs == 0,
            "store.sweep_interval_secs cannot be 0",
        ),
        (
            config.store.max_total_bytes == Some(0),
            "store.max_total_bytes cannot be 0",
        ),
    ];

    for (failed, message) in checks {
        if failed {
            return Err(ConfigError::ValidationError(message.to_string()));
        }
    }

    Ok(())
}
