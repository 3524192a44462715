//! Application configuration for PressPipe.
//!
//! User config lives at `~/.presspipe/presspipe.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the config file — they come from a
//! `.env`-style file or the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PressPipeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "presspipe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".presspipe";

// ---------------------------------------------------------------------------
// Config structs (matching presspipe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Collection names in the store.
    #[serde(default)]
    pub collections: CollectionsConfig,

    /// Field names used by the article schema.
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Upload behavior.
    #[serde(default)]
    pub upload: UploadConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `http://localhost:3000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API path prefix appended to the base URL.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Auth-enabled collection used for login.
    #[serde(default = "default_user_collection")]
    pub user_collection: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the `.env`-style credentials file.
    #[serde(default = "default_env_file")]
    pub env_file: String,

    /// Variable name holding the login email (never store the value itself).
    #[serde(default = "default_email_var")]
    pub email_var: String,

    /// Variable name holding the login password.
    #[serde(default = "default_password_var")]
    pub password_var: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            user_collection: default_user_collection(),
            timeout_secs: default_timeout_secs(),
            env_file: default_env_file(),
            email_var: default_email_var(),
            password_var: default_password_var(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}
fn default_api_prefix() -> String {
    "api".into()
}
fn default_user_collection() -> String {
    "users".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_env_file() -> String {
    ".env".into()
}
fn default_email_var() -> String {
    "PRESSPIPE_EMAIL".into()
}
fn default_password_var() -> String {
    "PRESSPIPE_PASSWORD".into()
}

/// `[collections]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    /// Articles collection.
    #[serde(default = "default_articles")]
    pub articles: String,

    /// Media collection.
    #[serde(default = "default_media")]
    pub media: String,

    /// Categories collection.
    #[serde(default = "default_categories")]
    pub categories: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            articles: default_articles(),
            media: default_media(),
            categories: default_categories(),
        }
    }
}

fn default_articles() -> String {
    "posts".into()
}
fn default_media() -> String {
    "media".into()
}
fn default_categories() -> String {
    "categories".into()
}

/// `[fields]` section — article schema field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Slug field on articles.
    #[serde(default = "default_slug_field")]
    pub slug: String,

    /// Body field on articles.
    #[serde(default = "default_body_field")]
    pub body: String,

    /// Featured-image field in the front matter.
    #[serde(default = "default_featured_image_field")]
    pub featured_image: String,

    /// Schema field the resolved media ID is written to. Defaults to the
    /// front-matter field name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_output: Option<String>,

    /// Category-label field in the front matter.
    #[serde(default = "default_category_field")]
    pub category: String,

    /// Schema field the resolved category IDs are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_output: Option<String>,

    /// Parent-relationship field on the categories collection. Setting this
    /// enables the two-level hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_parent: Option<String>,

    /// Filename field queried on the media collection.
    #[serde(default = "default_media_filename_field")]
    pub media_filename: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            slug: default_slug_field(),
            body: default_body_field(),
            featured_image: default_featured_image_field(),
            featured_image_output: None,
            category: default_category_field(),
            category_output: None,
            category_parent: None,
            media_filename: default_media_filename_field(),
        }
    }
}

fn default_slug_field() -> String {
    "slug".into()
}
fn default_body_field() -> String {
    "content".into()
}
fn default_featured_image_field() -> String {
    "featuredImage".into()
}
fn default_category_field() -> String {
    "categories".into()
}
fn default_media_filename_field() -> String {
    "filename".into()
}

/// `[upload]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Glob pattern for article files.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Recurse into subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Body storage format: "lexical" (node tree) or "html" (raw passthrough).
    #[serde(default = "default_body_format")]
    pub body_format: String,

    /// Directory searched for relative featured-image paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_root: Option<String>,

    /// Leading category labels dropped before hierarchy resolution.
    #[serde(default)]
    pub category_skip_first: usize,

    /// Default field values merged into every article payload.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            recursive: true,
            body_format: default_body_format(),
            media_root: None,
            category_skip_first: 0,
            defaults: BTreeMap::new(),
        }
    }
}

fn default_pattern() -> String {
    "*.html".into()
}
fn default_true() -> bool {
    true
}
fn default_body_format() -> String {
    "lexical".into()
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Login credentials for the store's auth collection.
#[derive(Clone)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Resolve credentials from explicit values, a `.env`-style file, or the
/// process environment, in that order per field.
///
/// The env file uses `KEY=VALUE` lines with `#` comments and optional
/// quoting; it is read without mutating the process environment.
pub fn load_credentials(
    email: Option<&str>,
    password: Option<&str>,
    env_file: &Path,
    email_var: &str,
    password_var: &str,
) -> Result<Credentials> {
    let mut file_values: BTreeMap<String, String> = BTreeMap::new();
    if env_file.exists() {
        let iter = dotenvy::from_path_iter(env_file)
            .map_err(|e| PressPipeError::config(format!("failed to read {env_file:?}: {e}")))?;
        for item in iter {
            let (key, value) = item.map_err(|e| {
                PressPipeError::config(format!("malformed line in {env_file:?}: {e}"))
            })?;
            file_values.insert(key, value);
        }
    }

    let lookup = |var: &str| -> Option<String> {
        file_values
            .get(var)
            .cloned()
            .or_else(|| std::env::var(var).ok())
            .filter(|v| !v.is_empty())
    };

    let email = match email {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => lookup(email_var).ok_or_else(|| {
            PressPipeError::config(format!(
                "credential '{email_var}' not found in {} or the environment",
                env_file.display()
            ))
        })?,
    };

    let password = match password {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => lookup(password_var).ok_or_else(|| {
            PressPipeError::config(format!(
                "credential '{password_var}' not found in {} or the environment",
                env_file.display()
            ))
        })?,
    };

    Ok(Credentials { email, password })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.presspipe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PressPipeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.presspipe/presspipe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PressPipeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PressPipeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PressPipeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PressPipeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PressPipeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
