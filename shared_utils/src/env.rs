use thiserror::Error;

/// Environment variable holding the Alpaca API key id.
pub const APCA_API_KEY_ID: &str = "APCA_API_KEY_ID";
/// Environment variable holding the Alpaca API secret key.
pub const APCA_API_SECRET_KEY: &str = "APCA_API_SECRET_KEY";

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing
/// or blank.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_var_names_the_variable() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_MISSING") };
        let err = get_env_var("SHARED_UTILS_TEST_MISSING").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHARED_UTILS_TEST_MISSING"
        );
    }

    #[test]
    #[serial]
    fn blank_var_counts_as_missing() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_BLANK", "  ") };
        assert!(get_env_var("SHARED_UTILS_TEST_BLANK").is_err());
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_BLANK") };
    }

    #[test]
    #[serial]
    fn present_var_is_returned() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_PRESENT", "abc") };
        assert_eq!(get_env_var("SHARED_UTILS_TEST_PRESENT").unwrap(), "abc");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_PRESENT") };
    }
}
