use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

pub const DB_KEY: &str = "TUNE_ADMIN_DB";
pub const SESSION_KEY: &str = "TUNE_ADMIN_SESSION";

pub const DEFAULT_DB_PATH: &str = "music.db";
pub const DEFAULT_SESSION_PATH: &str = "current_admin.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub session_path: PathBuf,
}

/// Values given on the command line. They beat everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub session_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct EnvFileValues {
    database_path: Option<PathBuf>,
    session_path: Option<PathBuf>,
}

/// Main entry point to get the runtime configuration.
/// Order: CLI flags, process environment, the `.env` file, defaults.
pub fn resolve_config(env_path: &Path, overrides: ConfigOverrides) -> Result<AppConfig> {
    resolve_with(env_path, overrides, |key| std::env::var(key).ok())
}

fn resolve_with(
    env_path: &Path,
    overrides: ConfigOverrides,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig> {
    let file = if env_path.exists() {
        let values = load_from_env(env_path)?;
        debug!("Loaded config from {:?}", env_path);
        values
    } else {
        EnvFileValues::default()
    };

    let database_path = overrides
        .database_path
        .or_else(|| lookup(DB_KEY).map(PathBuf::from))
        .or(file.database_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

    let session_path = overrides
        .session_path
        .or_else(|| lookup(SESSION_KEY).map(PathBuf::from))
        .or(file.session_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));

    Ok(AppConfig {
        database_path,
        session_path,
    })
}

fn load_from_env(path: &Path) -> Result<EnvFileValues> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut values = EnvFileValues::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                DB_KEY => values.database_path = Some(PathBuf::from(value)),
                SESSION_KEY => values.session_path = Some(PathBuf::from(value)),
                _ => {}
            }
        }
    }

    Ok(values)
}

/// Writes our keys to the `.env` file, keeping any unrelated lines.
pub fn save_to_env(path: &Path, config: &AppConfig) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
    };

    let mut file = File::create(path).context("Failed to create .env file")?;
    for line in existing.lines() {
        let key = line.split_once('=').map(|(key, _)| key.trim());
        if key == Some(DB_KEY) || key == Some(SESSION_KEY) {
            continue;
        }
        writeln!(file, "{}", line)?;
    }
    writeln!(file, "{}={}", DB_KEY, config.database_path.display())?;
    writeln!(file, "{}={}", SESSION_KEY, config.session_path.display())?;

    info!("Saved config to {:?}", path);
    Ok(())
}
