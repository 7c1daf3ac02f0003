//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cattree/cattree.toml`
//! 3. Local config: `--config <file>`, or `./cattree.toml` if present
//! 4. Environment variables: `CATTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::render::markup::{
    DEFAULT_TEMPLATE, DEFAULT_TITLE, DEFAULT_UTC_OFFSET_MINUTES,
};
use crate::application::render::{utc_offset_from_minutes, MarkupOptions, TreeRenderer};
use crate::application::services::{ArtifactNames, DEFAULT_HTML_ARTIFACT, DEFAULT_JSON_ARTIFACT};
use crate::application::{ApplicationError, IoResultExt};
use crate::domain::classify::{DEFAULT_COMPANIES, DEFAULT_COUNTRIES};
use crate::domain::{Classifier, ConflictPolicy, TreeBuilder, DEFAULT_ROOT_LABEL};

/// File name looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "cattree.toml";

/// Raw-file base of the upstream domain-list-community dataset.
pub const DEFAULT_SOURCE_URL_BASE: &str =
    "https://raw.githubusercontent.com/v2ray/domain-list-community/refs/heads/master/data";

/// Keyword lists driving node classification on the HTML page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Organization identifiers, matched as substrings
    pub companies: Vec<String>,
    /// Country codes, matched against the whole name
    pub countries: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            companies: DEFAULT_COMPANIES.iter().map(|s| s.to_string()).collect(),
            countries: DEFAULT_COUNTRIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Raw classify config for intermediate parsing (arrays are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawClassifyConfig {
    pub companies: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
}

impl ClassifyConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Union merge, used for the local layer.
    pub fn merge(&self, overlay: &RawClassifyConfig) -> Self {
        Self {
            companies: overlay
                .companies
                .as_ref()
                .map(|o| Self::merge_array(&self.companies, o))
                .unwrap_or_else(|| self.companies.clone()),
            countries: overlay
                .countries
                .as_ref()
                .map(|o| Self::merge_array(&self.countries, o))
                .unwrap_or_else(|| self.countries.clone()),
        }
    }

    /// Replace merge, used for the global layer: a list given in the global
    /// file replaces the compiled default entirely.
    pub fn apply_global(&self, global: &RawClassifyConfig) -> Self {
        Self {
            companies: global
                .companies
                .clone()
                .unwrap_or_else(|| self.companies.clone()),
            countries: global
                .countries
                .clone()
                .unwrap_or_else(|| self.countries.clone()),
        }
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.companies.clone(), self.countries.clone())
    }
}

/// Presentation settings for the HTML page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Page title
    pub title: String,
    /// Offset of the displayed timestamp, in minutes east of UTC
    pub utc_offset_minutes: i32,
    /// Base URL for per-node source links; unset disables the links
    pub source_url_base: Option<String>,
    /// Custom page template (minijinja); unset uses the built-in page
    pub template_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            source_url_base: Some(DEFAULT_SOURCE_URL_BASE.to_string()),
            template_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderConfig {
    pub title: Option<String>,
    pub utc_offset_minutes: Option<i32>,
    pub source_url_base: Option<String>,
    pub template_path: Option<PathBuf>,
}

impl RenderConfig {
    fn overlay(&self, raw: &RawRenderConfig) -> Self {
        Self {
            title: raw.title.clone().unwrap_or_else(|| self.title.clone()),
            utc_offset_minutes: raw.utc_offset_minutes.unwrap_or(self.utc_offset_minutes),
            source_url_base: raw
                .source_url_base
                .clone()
                .or_else(|| self.source_url_base.clone()),
            template_path: raw
                .template_path
                .clone()
                .or_else(|| self.template_path.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub json_file: Option<String>,
    pub html_file: Option<String>,
    pub root_label: Option<String>,
    pub conflict_policy: Option<ConflictPolicy>,
    pub render: RawRenderConfig,
    pub classify: RawClassifyConfig,
}

/// Unified configuration for cattree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Dataset root holding the category files (default: ./data)
    pub data_dir: PathBuf,
    /// Directory the artifacts are written to (default: .)
    pub output_dir: PathBuf,
    /// JSON artifact file name
    pub json_file: String,
    /// HTML artifact file name
    pub html_file: String,
    /// Label of the synthetic root above all top-level categories
    pub root_label: String,
    /// Handling of categories included by several parents
    pub conflict_policy: ConflictPolicy,
    pub render: RenderConfig,
    pub classify: ClassifyConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("."),
            json_file: DEFAULT_JSON_ARTIFACT.to_string(),
            html_file: DEFAULT_HTML_ARTIFACT.to_string(),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            conflict_policy: ConflictPolicy::default(),
            render: RenderConfig::default(),
            classify: ClassifyConfig::default(),
        }
    }
}

/// Get the XDG config directory for cattree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cattree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cattree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`, leaving the input untouched if expansion fails.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()))
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
        self.output_dir = expand_path(&self.output_dir);
        self.render.template_path = self.render.template_path.as_deref().map(expand_path);
    }

    /// Scalars: overlay wins if given. Arrays: union with negation.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            classify: self.classify.merge(&overlay.classify),
            ..self.overlay_scalars(overlay)
        }
    }

    /// Scalars: global wins if given. Arrays: replaced.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            classify: self.classify.apply_global(&global.classify),
            ..self.overlay_scalars(global)
        }
    }

    fn overlay_scalars(&self, raw: &RawSettings) -> Self {
        Self {
            data_dir: raw.data_dir.clone().unwrap_or_else(|| self.data_dir.clone()),
            output_dir: raw
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            json_file: raw.json_file.clone().unwrap_or_else(|| self.json_file.clone()),
            html_file: raw.html_file.clone().unwrap_or_else(|| self.html_file.clone()),
            root_label: raw
                .root_label
                .clone()
                .unwrap_or_else(|| self.root_label.clone()),
            conflict_policy: raw.conflict_policy.unwrap_or(self.conflict_policy),
            render: self.render.overlay(&raw.render),
            classify: self.classify.clone(),
        }
    }

    /// Load settings with layered precedence, reading the global file from
    /// [`global_config_path`].
    ///
    /// # Arguments
    /// * `local_config` - Explicit local config file; if `None`, `./cattree.toml`
    ///   is used when it exists
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_config: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_config)
    }

    /// Same as [`Settings::load`] with an explicit global file; `None` skips
    /// the global layer.
    pub fn load_from(
        global_config: Option<&Path>,
        local_config: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config (REPLACES defaults)
        if let Some(global_path) = global_config {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Local config (UNION with global)
        let local_path = match local_config {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = PathBuf::from(LOCAL_CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };
        if let Some(path) = local_path {
            debug!(path = %path.display(), "loading local config");
            let raw = load_raw_settings(&path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (replace)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply CATTREE_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`, e.g. `CATTREE_RENDER__TITLE`; lists are comma separated.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("CATTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("classify.companies")
                .with_list_parse_key("classify.countries"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "data_dir")? {
            settings.data_dir = PathBuf::from(val);
        }
        if let Some(val) = env_value::<String>(&config, "output_dir")? {
            settings.output_dir = PathBuf::from(val);
        }
        if let Some(val) = env_value(&config, "json_file")? {
            settings.json_file = val;
        }
        if let Some(val) = env_value(&config, "html_file")? {
            settings.html_file = val;
        }
        if let Some(val) = env_value(&config, "root_label")? {
            settings.root_label = val;
        }
        if let Some(val) = env_value(&config, "conflict_policy")? {
            settings.conflict_policy = val;
        }
        if let Some(val) = env_value(&config, "render.title")? {
            settings.render.title = val;
        }
        if let Some(val) = env_value::<i64>(&config, "render.utc_offset_minutes")? {
            settings.render.utc_offset_minutes =
                i32::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("render.utc_offset_minutes out of range: {val}"),
                })?;
        }
        if let Some(val) = env_value(&config, "render.source_url_base")? {
            settings.render.source_url_base = Some(val);
        }
        if let Some(val) = env_value::<String>(&config, "render.template_path")? {
            settings.render.template_path = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value(&config, "classify.companies")? {
            settings.classify.companies = val;
        }
        if let Some(val) = env_value(&config, "classify.countries")? {
            settings.classify.countries = val;
        }

        Ok(settings)
    }

    pub fn artifact_names(&self) -> ArtifactNames {
        ArtifactNames {
            json: self.json_file.clone(),
            html: self.html_file.clone(),
        }
    }

    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new()
            .with_policy(self.conflict_policy)
            .with_root_label(self.root_label.clone())
    }

    pub fn markup_options(&self) -> Result<MarkupOptions, ApplicationError> {
        let utc_offset = utc_offset_from_minutes(self.render.utc_offset_minutes).ok_or_else(|| {
            ApplicationError::Config {
                message: format!(
                    "render.utc_offset_minutes must be within +-24h, got {}",
                    self.render.utc_offset_minutes
                ),
            }
        })?;
        Ok(MarkupOptions {
            title: self.render.title.clone(),
            utc_offset,
            source_url_base: self
                .render
                .source_url_base
                .clone()
                .filter(|base| !base.is_empty()),
        })
    }

    /// Page template: the configured file, or the built-in page.
    pub fn load_template(&self) -> Result<String, ApplicationError> {
        match &self.render.template_path {
            Some(path) => std::fs::read_to_string(path).with_path_context("read page template", path),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    pub fn tree_renderer(&self) -> Result<TreeRenderer, ApplicationError> {
        Ok(TreeRenderer::new(
            self.classify.classifier(),
            self.load_template()?,
            self.markup_options()?,
        ))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cattree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cattree/cattree.toml   (defines your baseline)
#   Local:  ./cattree.toml or --config FILE  (per-dataset additions)
#   Env:    CATTREE_* environment variables  (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global. Use "!item" to REMOVE an inherited item:
#     companies = ["acme", "!zoom"]

# Directory holding the category files
# data_dir = "./data"

# Where domain_tree.json / domain_tree.html are written
# output_dir = "."
# json_file = "domain_tree.json"
# html_file = "domain_tree.html"

# Label of the synthetic root node
# root_label = "domain-list-community"

# "last-writer-wins" or "reject" for categories included by several parents
# conflict_policy = "last-writer-wins"

[render]
# title = "Domain List Community Tree"
# utc_offset_minutes = 480
# source_url_base = "https://raw.githubusercontent.com/v2ray/domain-list-community/refs/heads/master/data"
# template_path = "~/.config/cattree/page.html"

[classify]
# companies = ["google", "microsoft", "apple"]
# countries = ["cn", "us", "jp"]
"#
        .to_string()
    }
}

/// `None` if the variable is unset; a value that does not parse is an error.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_then_uses_upstream_layout() {
        let settings = Settings::default();
        assert_eq!(settings.data_dir, PathBuf::from("./data"));
        assert_eq!(settings.json_file, "domain_tree.json");
        assert_eq!(settings.html_file, "domain_tree.html");
        assert_eq!(settings.conflict_policy, ConflictPolicy::LastWriterWins);
        assert!(settings.classify.companies.contains(&"google".to_string()));
    }

    #[test]
    fn given_tilde_in_paths_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/dlc/data"),
            output_dir: PathBuf::from("$HOME/out"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.data_dir.to_string_lossy().starts_with(&home));
        assert!(settings.output_dir.to_string_lossy().starts_with(&home));
        assert!(!settings.data_dir.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_merge_array_union() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["c".to_string()];
        let result = ClassifyConfig::merge_array(&base, &overlay);
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_array_negation() {
        let base = vec!["a".to_string(), "b".to_string()];
        let overlay = vec!["!a".to_string(), "c".to_string()];
        let result = ClassifyConfig::merge_array(&base, &overlay);
        assert_eq!(result, vec!["b", "c"]);
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let base = vec!["a".to_string()];
        let overlay = vec!["!zzz".to_string()];
        assert_eq!(ClassifyConfig::merge_array(&base, &overlay), vec!["a"]);
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = ClassifyConfig::default();
        let global = RawClassifyConfig {
            companies: Some(vec!["acme".to_string()]),
            countries: None,
        };

        let result = base.apply_global(&global);

        assert_eq!(result.companies, vec!["acme"]);
        assert_eq!(result.countries, base.countries);
    }

    #[test]
    fn test_merge_with_keeps_unspecified_scalars() {
        let base = Settings::default();
        let raw: RawSettings = toml::from_str(
            r#"
root_label = "dlc"
conflict_policy = "reject"

[render]
title = "Lists"
"#,
        )
        .unwrap();

        let merged = base.merge_with(&raw);

        assert_eq!(merged.root_label, "dlc");
        assert_eq!(merged.conflict_policy, ConflictPolicy::Reject);
        assert_eq!(merged.render.title, "Lists");
        assert_eq!(merged.render.utc_offset_minutes, DEFAULT_UTC_OFFSET_MINUTES);
        assert_eq!(merged.data_dir, base.data_dir);
    }

    #[test]
    fn given_offset_out_of_range_when_building_markup_options_then_errors() {
        let mut settings = Settings::default();
        settings.render.utc_offset_minutes = 25 * 60;
        assert!(matches!(
            settings.markup_options(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_empty_source_url_base_then_links_are_disabled() {
        let mut settings = Settings::default();
        settings.render.source_url_base = Some(String::new());
        assert_eq!(settings.markup_options().unwrap().source_url_base, None);
    }

    #[test]
    fn given_settings_when_to_toml_then_round_trips() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
