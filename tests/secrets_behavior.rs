//! Behavior tests for credential lookup across secrets files and layers.

use std::fs;
use std::sync::Arc;

use ferrodash_core::{
    load_credentials, run_dashboard_shared, CredentialsError, LayeredSecretStore, SecretStore,
    SecretStoreError, TomlSecretStore,
};
use ferrodash_tests::*;
use tempfile::tempdir;

#[test]
fn secrets_file_supplies_both_keys() {
    // Given: a secrets.toml with both entries
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(
        &path,
        "BINANCE_API_KEY = \"file-key\"\nBINANCE_API_SECRET = \"file-secret\"\n",
    )
    .expect("write secrets");

    // When: credentials are loaded from it
    let credentials = load_credentials(&TomlSecretStore::new(&path)).expect("complete file");

    // Then: both values come through and neither is printed by Debug
    assert_eq!(credentials.api_key(), "file-key");
    assert_eq!(credentials.api_secret(), "file-secret");
    let debug = format!("{credentials:?}");
    assert!(!debug.contains("file-key"));
    assert!(!debug.contains("file-secret"));
}

#[test]
fn missing_secrets_file_behaves_like_an_empty_store() {
    let dir = tempdir().expect("temp dir");
    let store = TomlSecretStore::new(dir.path().join("absent.toml"));

    assert_eq!(store.get(API_KEY_SECRET).expect("store works"), None);
    assert!(matches!(
        load_credentials(&store),
        Err(CredentialsError::Missing { name: "BINANCE_API_KEY" })
    ));
}

#[test]
fn malformed_secrets_file_is_a_store_error() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(&path, "BINANCE_API_KEY = \"unterminated\n").expect("write secrets");

    let error = load_credentials(&TomlSecretStore::new(&path)).expect_err("must fail");
    assert!(matches!(
        error,
        CredentialsError::Store(SecretStoreError::Parse { .. })
    ));
}

#[test]
fn earlier_layers_win_and_later_layers_fill_gaps() {
    // Given: the file only has the key, a fallback store has both
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(&path, "BINANCE_API_KEY = \"file-key\"\n").expect("write secrets");

    let store = LayeredSecretStore::new()
        .with_layer(TomlSecretStore::new(&path))
        .with_layer(
            MapSecretStore::new()
                .with(API_KEY_SECRET, "fallback-key")
                .with(API_SECRET_SECRET, "fallback-secret"),
        );

    // When: credentials are loaded
    let credentials = load_credentials(&store).expect("layers complete each other");

    // Then: the file key wins and the secret comes from the fallback
    assert_eq!(credentials.api_key(), "file-key");
    assert_eq!(credentials.api_secret(), "fallback-secret");
}

#[tokio::test]
async fn secrets_file_drives_a_full_dashboard_run() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(
        &path,
        "BINANCE_API_KEY = \"file-key\"\nBINANCE_API_SECRET = \"file-secret\"\n",
    )
    .expect("write secrets");
    let connector = CountingConnector::new(ScriptedClient::answering(hourly_klines(60)));

    let snapshot = run_dashboard(
        &DashboardConfig::default(),
        &TomlSecretStore::new(&path),
        &connector,
    )
    .await
    .expect("run should succeed");

    assert_eq!(snapshot.table.len(), 26);
    assert_eq!(connector.seen_keys(), vec![String::from("file-key")]);
}

#[test]
fn blank_file_entry_falls_through_to_next_layer() {
    // Given: the file holds a blank key and a fallback store has both
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(&path, "BINANCE_API_KEY = \"  \"\n").expect("write secrets");

    let store = LayeredSecretStore::new()
        .with_layer(TomlSecretStore::new(&path))
        .with_layer(
            MapSecretStore::new()
                .with(API_KEY_SECRET, "fallback-key")
                .with(API_SECRET_SECRET, "fallback-secret"),
        );

    // When: credentials are loaded
    let credentials = load_credentials(&store).expect("fallback fills the blank");

    // Then: the blank entry does not hide the fallback
    assert_eq!(credentials.api_key(), "fallback-key");
}

#[tokio::test]
async fn shared_store_reads_the_secrets_file_off_the_runtime() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("secrets.toml");
    fs::write(
        &path,
        "BINANCE_API_KEY = \"file-key\"\nBINANCE_API_SECRET = \"file-secret\"\n",
    )
    .expect("write secrets");
    let secrets: Arc<dyn SecretStore> = Arc::new(TomlSecretStore::new(&path));
    let connector = CountingConnector::new(ScriptedClient::answering(hourly_klines(60)));

    let snapshot = run_dashboard_shared(&DashboardConfig::default(), secrets, &connector)
        .await
        .expect("run should succeed");

    assert_eq!(snapshot.table.len(), 26);
    assert_eq!(connector.seen_keys(), vec![String::from("file-key")]);
}

#[tokio::test]
async fn shared_store_reports_missing_credentials() {
    let dir = tempdir().expect("temp dir");
    let secrets: Arc<dyn SecretStore> =
        Arc::new(TomlSecretStore::new(dir.path().join("absent.toml")));
    let connector = CountingConnector::new(ScriptedClient::answering(hourly_klines(60)));

    let error = run_dashboard_shared(&DashboardConfig::default(), secrets, &connector)
        .await
        .expect_err("must halt");

    assert_eq!(error.kind(), DashboardErrorKind::Configuration);
    assert!(connector.seen_keys().is_empty());
}
