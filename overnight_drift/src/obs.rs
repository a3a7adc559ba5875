use tracing_subscriber::{EnvFilter, filter::ParseError};

/// Overrides `--log-level` when set, e.g. `OVERNIGHT_DRIFT_LOG=overnight_drift=debug`.
pub const LOG_ENV: &str = "OVERNIGHT_DRIFT_LOG";

/// `OVERNIGHT_DRIFT_LOG` when it holds a valid filter, `log_level` otherwise.
pub fn env_filter(log_level: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new(log_level))
}

/// Installs the global subscriber. Logs go to stderr so stdout stays clean
/// for results.
pub fn init_tracing(log_level: &str) -> Result<(), ParseError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level)?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn env_var_overrides_flag() {
        unsafe { std::env::remove_var(LOG_ENV) };
        assert_eq!(env_filter("debug").unwrap().to_string(), "debug");
        assert!(env_filter("overnight_drift=loud").is_err());

        unsafe { std::env::set_var(LOG_ENV, "overnight_drift=trace") };
        assert_eq!(env_filter("debug").unwrap().to_string(), "overnight_drift=trace");
        unsafe { std::env::remove_var(LOG_ENV) };
    }
}
