use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. `RUST_LOG` always wins
/// when set; otherwise falls back to `level`.
pub fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("failed to set global tracing subscriber: {e}"))?;

    Ok(())
}
