use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use keysort_library::config::error::Result as ValidationResult;
use keysort_library::{BatchConfig, Mode, validate_config};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ENV_PREFIX: &str = "KEYSORT_";
const RULE_SEPARATOR: &str = "=>";

/// One `pattern => destination` row as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetting {
    pub pattern: String,
    pub destination: String,
}
impl FromStr for RuleSetting {
    type Err = crate::error::Error;

    /// Parses `PATTERN=>FOLDER`, splitting on the first `=>`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some((pattern, destination)) = s.split_once(RULE_SEPARATOR) else {
            exn::bail!(ErrorKind::MalformedRule(s.to_string()));
        };
        Ok(Self {
            pattern: pattern.trim().to_string(),
            destination: destination.trim().to_string(),
        })
    }
}

/// Everything a batch can be configured with, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: String,
    /// Empty means "sort in place".
    pub target: String,
    pub mode: Mode,
    pub recursive: bool,
    pub rules: Vec<RuleSetting>,
    /// A `tracing` filter directive such as `info` or `keysort=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Location of the per-user config file, if the platform has a config
/// directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "keysort").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Settings {
    /// Loads every layer, including the per-user config file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(user_config_path().as_deref(), explicit)
    }

    /// Loads every layer with the per-user file at `user` instead of the
    /// platform default. A missing user file is skipped; a missing explicit
    /// file is an error.
    pub fn load_from(user: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        extract(files(user, explicit)?.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Hands the raw values to [`validate_config`].
    pub fn batch_config(&self) -> ValidationResult<BatchConfig> {
        validate_config(
            &self.source,
            &self.target,
            self.rules.iter().map(|rule| (rule.pattern.as_str(), rule.destination.as_str())),
            self.mode,
            self.recursive,
        )
    }
}

/// Defaults plus the file layers, without the environment.
fn files(user: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(user) = user
        && user.is_file()
    {
        tracing::debug!(path = %user.display(), "Loading user config");
        figment = figment.merge(Toml::file(user));
    }
    if let Some(explicit) = explicit {
        if !explicit.is_file() {
            exn::bail!(ErrorKind::NotFound(explicit.to_path_buf()));
        }
        tracing::debug!(path = %explicit.display(), "Loading config file");
        figment = merge_file(figment, explicit)?;
    }
    Ok(figment)
}

fn extract(figment: Figment) -> Result<Settings> {
    figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()).into())
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
