//! Credential loading from secret stores.
//!
//! Secrets are looked up by name (`BINANCE_API_KEY`, `BINANCE_API_SECRET`).
//! Stores are read on every dashboard run so an operator can fix a missing
//! value and simply refresh the page.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use thiserror::Error;

pub const API_KEY_SECRET: &str = "BINANCE_API_KEY";
pub const API_SECRET_SECRET: &str = "BINANCE_API_SECRET";

/// Exchange API key pair. Never logged: `Debug` redacts both halves.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Failure of the store itself, as opposed to a missing entry.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("failed to read secrets file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("secret '{name}' in '{path}' must be a string")]
    NotAString { name: String, path: PathBuf },
}

/// Why credentials could not be produced.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("secret '{name}' is missing")]
    Missing { name: &'static str },

    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

/// Key-value lookup of named secrets.
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` means the store works but does not hold `name`.
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError>;

    /// Looks up several names against one view of the store. Values are
    /// returned in `names` order.
    fn get_many(&self, names: &[&str]) -> Result<Vec<Option<String>>, SecretStoreError> {
        names.iter().map(|name| self.get(name)).collect()
    }
}

/// Reads both named secrets in one store lookup. Blank values count as missing.
pub fn load_credentials(store: &dyn SecretStore) -> Result<Credentials, CredentialsError> {
    let mut values = store
        .get_many(&[API_KEY_SECRET, API_SECRET_SECRET])?
        .into_iter();
    let api_key = require(API_KEY_SECRET, values.next().flatten())?;
    let api_secret = require(API_SECRET_SECRET, values.next().flatten())?;
    Ok(Credentials::new(api_key, api_secret))
}

fn require(name: &'static str, value: Option<String>) -> Result<String, CredentialsError> {
    non_blank(value).ok_or(CredentialsError::Missing { name })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(std::env::var(name).ok())
    }
}

/// Flat `secrets.toml` file of string entries.
///
/// A missing file behaves like an empty store; an unreadable or malformed
/// file is a store failure.
#[derive(Debug, Clone)]
pub struct TomlSecretStore {
    path: PathBuf,
}

impl TomlSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_table(&self) -> Result<Option<toml::Table>, SecretStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SecretStoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        content
            .parse::<toml::Table>()
            .map(Some)
            .map_err(|source| SecretStoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn lookup(&self, table: &toml::Table, name: &str) -> Result<Option<String>, SecretStoreError> {
        match table.get(name) {
            None => Ok(None),
            Some(toml::Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(SecretStoreError::NotAString {
                name: name.to_owned(),
                path: self.path.clone(),
            }),
        }
    }
}

impl SecretStore for TomlSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.get_many(&[name])?.pop().flatten())
    }

    /// Reads and parses the file once for all names.
    fn get_many(&self, names: &[&str]) -> Result<Vec<Option<String>>, SecretStoreError> {
        let Some(table) = self.load_table()? else {
            return Ok(vec![None; names.len()]);
        };
        names.iter().map(|name| self.lookup(&table, name)).collect()
    }
}

/// In-memory store for injected configuration.
#[derive(Debug, Clone, Default)]
pub struct MapSecretStore {
    values: BTreeMap<String, String>,
}

impl MapSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for MapSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.values.get(name).cloned())
    }
}

/// Ordered stores; the first store holding a non-blank value wins.
#[derive(Default)]
pub struct LayeredSecretStore {
    layers: Vec<Box<dyn SecretStore>>,
}

impl LayeredSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, store: impl SecretStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl SecretStore for LayeredSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.get_many(&[name])?.pop().flatten())
    }

    fn get_many(&self, names: &[&str]) -> Result<Vec<Option<String>>, SecretStoreError> {
        let mut found: Vec<Option<String>> = vec![None; names.len()];
        for layer in &self.layers {
            if found.iter().all(Option::is_some) {
                break;
            }
            for (slot, value) in found.iter_mut().zip(layer.get_many(names)?) {
                if slot.is_none() {
                    *slot = non_blank(value);
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn complete_store() -> MapSecretStore {
        MapSecretStore::new()
            .with(API_KEY_SECRET, "key")
            .with(API_SECRET_SECRET, "secret")
    }

    #[test]
    fn loads_both_secrets() {
        let credentials = load_credentials(&complete_store()).expect("complete store");
        assert_eq!(credentials.api_key(), "key");
        assert_eq!(credentials.api_secret(), "secret");
    }

    #[test]
    fn missing_key_names_the_secret() {
        let store = MapSecretStore::new().with(API_SECRET_SECRET, "secret");
        let error = load_credentials(&store).expect_err("must fail");
        assert!(matches!(
            error,
            CredentialsError::Missing { name: API_KEY_SECRET }
        ));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let store = complete_store().with(API_SECRET_SECRET, "  ");
        let error = load_credentials(&store).expect_err("must fail");
        assert!(matches!(
            error,
            CredentialsError::Missing {
                name: API_SECRET_SECRET
            }
        ));
    }

    #[test]
    fn debug_output_redacts_values() {
        let credentials = Credentials::new("visible-key", "visible-secret");
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("visible-key"));
        assert!(!rendered.contains("visible-secret"));
    }

    #[test]
    fn toml_store_reads_string_entries() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "BINANCE_API_KEY = \"file-key\"\nBINANCE_API_SECRET = \"file-secret\"")
            .expect("write secrets");

        let store = TomlSecretStore::new(file.path());
        let credentials = load_credentials(&store).expect("file store");
        assert_eq!(credentials.api_key(), "file-key");
    }

    #[test]
    fn toml_store_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = TomlSecretStore::new(dir.path().join("secrets.toml"));
        assert_eq!(store.get(API_KEY_SECRET).expect("no failure"), None);
    }

    #[test]
    fn toml_store_reports_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "BINANCE_API_KEY = ").expect("write secrets");

        let store = TomlSecretStore::new(file.path());
        let error = load_credentials(&store).expect_err("must fail");
        assert!(matches!(
            error,
            CredentialsError::Store(SecretStoreError::Parse { .. })
        ));
    }

    #[test]
    fn toml_store_rejects_non_string_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "BINANCE_API_KEY = 42").expect("write secrets");

        let store = TomlSecretStore::new(file.path());
        let error = store.get(API_KEY_SECRET).expect_err("must fail");
        assert!(matches!(error, SecretStoreError::NotAString { .. }));
    }

    /// Counts single and batched lookups.
    #[derive(Default)]
    struct CountingStore {
        inner: MapSecretStore,
        gets: AtomicUsize,
        batches: AtomicUsize,
    }

    impl SecretStore for CountingStore {
        fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(name)
        }

        fn get_many(&self, names: &[&str]) -> Result<Vec<Option<String>>, SecretStoreError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            names.iter().map(|name| self.inner.get(name)).collect()
        }
    }

    #[test]
    fn credentials_come_from_one_store_lookup() {
        let store = CountingStore {
            inner: complete_store(),
            ..CountingStore::default()
        };

        load_credentials(&store).expect("complete store");

        assert_eq!(store.batches.load(Ordering::SeqCst), 1);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn toml_store_batch_reads_every_name() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "BINANCE_API_KEY = \"file-key\"").expect("write secrets");

        let store = TomlSecretStore::new(file.path());
        let values = store
            .get_many(&[API_KEY_SECRET, API_SECRET_SECRET])
            .expect("readable file");
        assert_eq!(values, vec![Some(String::from("file-key")), None]);
    }

    #[test]
    fn blank_layer_does_not_hide_later_layers() {
        let store = LayeredSecretStore::new()
            .with_layer(
                MapSecretStore::new()
                    .with(API_KEY_SECRET, "")
                    .with(API_SECRET_SECRET, "file-secret"),
            )
            .with_layer(complete_store());

        let credentials = load_credentials(&store).expect("later layer fills the blank");
        assert_eq!(credentials.api_key(), "key");
        assert_eq!(credentials.api_secret(), "file-secret");
        assert_eq!(
            store.get(API_KEY_SECRET).expect("store works"),
            Some(String::from("key"))
        );
    }

    #[test]
    fn layered_store_prefers_earlier_layers() {
        let store = LayeredSecretStore::new()
            .with_layer(MapSecretStore::new().with(API_KEY_SECRET, "first"))
            .with_layer(complete_store());

        let credentials = load_credentials(&store).expect("layers combine");
        assert_eq!(credentials.api_key(), "first");
        assert_eq!(credentials.api_secret(), "secret");
    }
}
