use std::fmt;
use std::path::{Path, PathBuf};

pub const DB_URL_ENV: &str = "SCIENCE_DB_URL";
pub const DEFAULT_DB_URL: &str = "sqlite://science.sqlite3";

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug)]
pub enum ConfigError {
    InvalidDbUrl { raw: String },
    CreateDb { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ConfigError::CreateDb { path, source } => {
                write!(f, "cannot create database {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolve the database URL from the `--db` flag (which clap also fills from
/// `SCIENCE_DB_URL`), falling back to a file in the working directory.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDbUrl` for a blank value.
pub fn resolve_db_url(flag: Option<String>) -> Result<String, ConfigError> {
    let Some(raw) = flag else {
        return Ok(normalize_sqlite_url(DEFAULT_DB_URL.to_string()));
    };
    if raw.trim().is_empty() {
        return Err(ConfigError::InvalidDbUrl { raw });
    }
    Ok(normalize_sqlite_url(raw))
}

/// `sqlite::memory:` and `sqlite:file:` URIs go to sqlx untouched; their
/// query parameters (`mode=memory`, `cache=shared`) only mean something there.
fn is_uri_passthrough(url: &str) -> bool {
    url == MEMORY_URL || url.starts_with("sqlite:file:")
}

/// Turn `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if is_uri_passthrough(trimmed) {
        return trimmed.to_string();
    }

    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its parent directories) if missing.
///
/// # Errors
///
/// Returns `ConfigError` if the URL has no path or the file cannot be
/// created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if is_uri_passthrough(db_url) {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    let create_err = |source| ConfigError::CreateDb {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(create_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(create_err)?;
    }

    Ok(())
}
