use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.dep-diff/config.toml`.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Which files are dependency files, and for which ecosystem.
    #[serde(default = "default_ecosystems")]
    pub ecosystems: Vec<EcosystemConfig>,
}

/// Binds an ecosystem to the dependency file whose diffs it analyzes.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EcosystemConfig {
    /// Ecosystem identifier (`npm`, `go`, `pypi`), case-insensitive.
    pub name: String,
    /// File name or trailing path, e.g. `package-lock.json`.
    pub depfile: String,
}

fn default_ecosystems() -> Vec<EcosystemConfig> {
    [
        ("npm", "package-lock.json"),
        ("go", "go.sum"),
        ("pypi", "requirements.txt"),
    ]
    .into_iter()
    .map(|(name, depfile)| EcosystemConfig {
        name: name.to_string(),
        depfile: depfile.to_string(),
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ecosystems: default_ecosystems(),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<base>/.dep-diff/config.toml`
/// 3. `~/.config/dep-diff/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(base: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = base.join(".dep-diff").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("dep-diff").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    tracing::debug!("no config file found, using built-in depfiles");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
