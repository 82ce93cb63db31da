//! Layered configuration for the `scholar-qa` binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use qa_flow::{FlowConfig, SimulatedSubmitter};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "scholar-qa";
const PROJECT_FILE: &str = "scholar-qa.toml";
const ENV_PREFIX: &str = "SCHOLAR_QA_";

/// Output mode for the wizard display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub flow: FlowConfig,
    pub submission: SubmissionConfig,
    pub output: OutputConfig,
}

/// Settings of the simulated submission backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub delay_ms: u64,
    /// Make every submission fail, to exercise the failure policy.
    pub fail: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            fail: false,
        }
    }
}

impl SubmissionConfig {
    pub fn submitter(&self) -> SimulatedSubmitter {
        let delay = Duration::from_millis(self.delay_ms);
        if self.fail {
            SimulatedSubmitter::failing(delay, "submission backend rejected the answers")
        } else {
            SimulatedSubmitter::new(delay)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub answers_json: bool,
    pub format: RenderFormat,
}

/// Merges configuration sources.
///
/// Priority (highest to lowest):
/// 1. `SCHOLAR_QA_*` environment variables (`__` separates sections)
/// 2. Explicit `--config` file
/// 3. Project file `./scholar-qa.toml`
/// 4. Global file `$XDG_CONFIG_HOME/scholar-qa/config.toml`
/// 5. Built-in defaults
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(config_path: Option<&Path>) -> Result<AppConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let project = PathBuf::from(PROJECT_FILE);
        if project.exists() {
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }
}
