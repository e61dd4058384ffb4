//! Tracing initialisation for processes hosting a configuration provider

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize console tracing at `log_level` (an `EnvFilter` directive such
/// as `info` or `config_provider=debug`).
///
/// An invalid directive falls back to `RUST_LOG`, then to `info`. Returns
/// `false` when a global subscriber was already installed; that subscriber
/// is left in place.
pub fn init_simple_tracing(log_level: &str) -> Result<bool> {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(target: "config_provider", level = log_level, "Tracing initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_init_installs() {
        init_simple_tracing("config_provider=debug").unwrap();
        assert!(!init_simple_tracing("not a [valid directive").unwrap());
    }
}
