use std::io::Write;

use secrecy::ExposeSecret;
use serial_test::serial;
use shared_utils::config::{ConfigError, Credentials};
use tempfile::NamedTempFile;

#[test]
fn reads_credentials_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"ALPACA_KEY": "PKFILE", "ALPACA_SECRET": "filesecret"}}"#
    )
    .unwrap();

    let creds = Credentials::load(Some(file.path())).unwrap();
    assert_eq!(creds.key_id().expose_secret(), "PKFILE");
    assert_eq!(creds.secret_key().expose_secret(), "filesecret");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let err = Credentials::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
#[serial]
fn env_fallback_reads_alpaca_variables() {
    unsafe {
        std::env::set_var("APCA_API_KEY_ID", "PKENV");
        std::env::set_var("APCA_API_SECRET_KEY", "envsecret");
    }
    let creds = Credentials::from_env().unwrap();
    assert_eq!(creds.key_id().expose_secret(), "PKENV");
    unsafe {
        std::env::remove_var("APCA_API_KEY_ID");
        std::env::remove_var("APCA_API_SECRET_KEY");
    }
}

#[test]
#[serial]
fn env_fallback_without_variables_fails() {
    unsafe {
        std::env::remove_var("APCA_API_KEY_ID");
        std::env::remove_var("APCA_API_SECRET_KEY");
    }
    let err = Credentials::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(_)));
}
