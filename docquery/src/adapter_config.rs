//! Connection settings for an [crate::Adapter].

use crate::common::{DEFAULT_DATABASE, DEFAULT_MAX_DEPTH, MEMORY_SCHEME};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::store::DocumentStore;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

static URI_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<rest>[^\s]*)$"));

const INVALID_DATABASE_CHARS: [char; 8] = ['/', '\\', '.', ' ', '"', '$', '*', '\0'];

/// Splits a connection URI into its scheme and the remainder.
///
/// ```rust
/// use docquery::parse_uri;
///
/// let (scheme, rest) = parse_uri("memory://local").unwrap();
/// assert_eq!(scheme, "memory");
/// assert_eq!(rest, "local");
/// assert!(parse_uri("no scheme here").is_err());
/// ```
pub fn parse_uri(uri: &str) -> QueryResult<(String, String)> {
    let pattern = URI_PATTERN.as_ref().map_err(|err| {
        log::error!("Failed to compile the connection uri pattern: {}", err);
        QueryError::new(
            &format!("Failed to compile the connection uri pattern: {}", err),
            ErrorKind::InternalError,
        )
    })?;

    match pattern.captures(uri) {
        Some(captures) => {
            let scheme = captures
                .name("scheme")
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            let rest = captures
                .name("rest")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Ok((scheme, rest))
        }
        None => {
            log::error!("Invalid connection uri '{}'", uri);
            Err(QueryError::new(
                &format!("Invalid connection uri '{}', expected scheme://address", uri),
                ErrorKind::InvalidUri,
            ))
        }
    }
}

/// Settings an [crate::Adapter] connects with.
///
/// The config is shared: clones see the same values. It can be changed until
/// an adapter connects with it; after that every setter fails with
/// [ErrorKind::InvalidOperation].
#[derive(Clone)]
pub struct AdapterConfig {
    inner: Arc<AdapterConfigInner>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterConfig {
    pub fn new() -> Self {
        AdapterConfig {
            inner: Arc::new(AdapterConfigInner::new()),
        }
    }

    /// The connection URI, `memory://` unless set.
    pub fn uri(&self) -> String {
        self.inner.uri.read().clone()
    }

    pub fn set_uri(&self, uri: &str) -> QueryResult<()> {
        self.inner.check_not_configured("uri")?;
        parse_uri(uri)?;
        *self.inner.uri.write() = uri.to_string();
        Ok(())
    }

    /// The scheme of [AdapterConfig::uri], lower-cased.
    pub fn scheme(&self) -> QueryResult<String> {
        parse_uri(&self.uri()).map(|(scheme, _)| scheme)
    }

    pub fn database(&self) -> String {
        self.inner.database.read().clone()
    }

    pub fn set_database(&self, database: &str) -> QueryResult<()> {
        self.inner.check_not_configured("database")?;
        if database.is_empty() || database.contains(INVALID_DATABASE_CHARS) {
            log::error!("Invalid database name '{}'", database);
            return Err(QueryError::new(
                &format!("Invalid database name '{}'", database),
                ErrorKind::ValidationError,
            ));
        }
        *self.inner.database.write() = database.to_string();
        Ok(())
    }

    /// Deepest record nesting the projection engine flattens.
    pub fn max_nesting_depth(&self) -> usize {
        self.inner.max_nesting_depth.load(Ordering::Relaxed)
    }

    pub fn set_max_nesting_depth(&self, depth: usize) -> QueryResult<()> {
        self.inner.check_not_configured("max nesting depth")?;
        if depth == 0 {
            log::error!("Max nesting depth must be greater than zero");
            return Err(QueryError::new(
                "Max nesting depth must be greater than zero",
                ErrorKind::ValidationError,
            ));
        }
        self.inner.max_nesting_depth.store(depth, Ordering::Relaxed);
        Ok(())
    }

    /// A store supplied by the caller, used instead of the one the URI scheme
    /// would select.
    pub fn store(&self) -> Option<DocumentStore> {
        self.inner.store.get().cloned()
    }

    pub fn set_store(&self, store: DocumentStore) -> QueryResult<()> {
        self.inner.check_not_configured("store")?;
        self.inner.store.set(store).map_err(|_| {
            log::error!("A custom store is already set");
            QueryError::new("A custom store is already set", ErrorKind::InvalidOperation)
        })
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Acquire)
    }

    pub(crate) fn mark_configured(&self) {
        self.inner.configured.store(true, Ordering::Release);
    }
}

struct AdapterConfigInner {
    configured: AtomicBool,
    uri: RwLock<String>,
    database: RwLock<String>,
    max_nesting_depth: AtomicUsize,
    store: OnceLock<DocumentStore>,
}

impl AdapterConfigInner {
    fn new() -> Self {
        AdapterConfigInner {
            configured: AtomicBool::from(false),
            uri: RwLock::new(format!("{}://", MEMORY_SCHEME)),
            database: RwLock::new(DEFAULT_DATABASE.to_string()),
            max_nesting_depth: AtomicUsize::from(DEFAULT_MAX_DEPTH),
            store: OnceLock::new(),
        }
    }

    fn check_not_configured(&self, setting: &str) -> QueryResult<()> {
        if self.configured.load(Ordering::Acquire) {
            log::error!("The {} cannot be changed after connecting", setting);
            return Err(QueryError::new(
                &format!("The {} cannot be changed after connecting", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
