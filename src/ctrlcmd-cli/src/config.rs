//! Configuration management for ctrlcmd CLI

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const GENERATED_SUBDIR: &str = "src/nvidia/generated";
const CTRL_SUBDIR: &str = "src/common/sdk/nvidia/inc/ctrl";
const OUTPUT_SUBPATH: &str = "tools/hook/nv_ctrl_cmd_table.h";

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Root of the driver source tree
    pub source_root: Option<PathBuf>,
    pub generated_dir: Option<PathBuf>,
    pub ctrl_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Appended to the built-in deny list
    #[serde(default)]
    pub deny_fragments: Vec<String>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("ctrlcmd");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    pub fn set_source_root(&mut self, root: PathBuf) {
        self.source_root = Some(root);
    }

    /// Source root from the command line, falling back to the configured one
    pub fn source_root(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf).or_else(|| self.source_root.clone())
    }

    /// Directory of generated `g_<class>_nvoc.c` files
    pub fn generated_dir(&self, flag: Option<PathBuf>, root: Option<&Path>) -> Result<PathBuf> {
        resolve(
            flag,
            self.generated_dir.as_deref(),
            root,
            GENERATED_SUBDIR,
            "--generated-dir",
        )
    }

    /// Directory of control headers scanned by `generate`
    pub fn ctrl_dir(&self, flag: Option<PathBuf>, root: Option<&Path>) -> Result<PathBuf> {
        resolve(flag, self.ctrl_dir.as_deref(), root, CTRL_SUBDIR, "--ctrl-dir")
    }

    /// Header that receives the generated table
    pub fn output(&self, flag: Option<PathBuf>, root: Option<&Path>) -> Result<PathBuf> {
        resolve(flag, self.output.as_deref(), root, OUTPUT_SUBPATH, "--output")
    }
}

/// Flag beats configured override beats the path derived from the root
fn resolve(
    flag: Option<PathBuf>,
    configured: Option<&Path>,
    root: Option<&Path>,
    subpath: &str,
    flag_name: &str,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    if let Some(root) = root {
        return Ok(root.join(subpath));
    }

    bail!(
        "No path configured. Pass {} or --source-root, or run: ctrlcmd configure --source-root <DIR>",
        flag_name
    )
}
