use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Initialize the global subscriber, writing through the test harness's captured output
///
/// `RUST_LOG` directives take precedence over `level`.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: Level) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {e}"))?;

    tracing::info!("Logging initialized: level={level}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // another test may already have installed the subscriber
        let _ = init_logging(Level::DEBUG);
        assert!(init_logging(Level::DEBUG).is_err());
    }
}
