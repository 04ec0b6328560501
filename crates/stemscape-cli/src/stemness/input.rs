use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use stemscape_classifiers::config::ForestConfig;
use stemscape_classifiers::data_handling::TableColumns;

/// Model settings that can be supplied as a JSON file via `--config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub forest: ForestConfig,
    /// Size of the global rayon pool. `None` uses rayon's default.
    pub threads: Option<usize>,
}

/// Everything a single stemness run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemnessConfig {
    pub train_data: PathBuf,
    pub test_data: PathBuf,
    pub label_column: String,
    pub sample_column: Option<String>,
    pub output_dir: PathBuf,
    pub settings: ModelSettings,
}

impl StemnessConfig {
    pub fn new(
        train_data: impl Into<PathBuf>,
        test_data: impl Into<PathBuf>,
        label_column: impl Into<String>,
        sample_column: Option<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_data: train_data.into(),
            test_data: test_data.into(),
            label_column: label_column.into(),
            sample_column,
            output_dir: output_dir.into(),
            settings: ModelSettings::default(),
        }
    }

    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let train_data: &PathBuf = matches
            .get_one("train")
            .context("Missing required argument --train")?;
        let test_data: &PathBuf = matches
            .get_one("test")
            .context("Missing required argument --test")?;
        let label_column: &String = matches
            .get_one("label")
            .context("Missing required argument --label")?;
        let output_dir: &PathBuf = matches
            .get_one("outdir")
            .context("Missing required argument --outdir")?;

        validate_input_file(train_data)?;
        validate_input_file(test_data)?;

        let mut config = Self::new(
            train_data,
            test_data,
            label_column,
            matches.get_one::<String>("sample").cloned(),
            output_dir,
        );

        if let Some(config_path) = matches.get_one::<PathBuf>("config") {
            config.settings = load_model_settings(config_path)?;
        }

        // Apply CLI overrides
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.settings.forest.seed = *seed;
        }
        if let Some(n_estimators) = matches.get_one::<usize>("n_estimators") {
            config.settings.forest.n_estimators = *n_estimators;
        }
        if let Some(threads) = matches.get_one::<usize>("threads") {
            config.settings.threads = Some(*threads);
        }

        config
            .settings
            .forest
            .validate()
            .context("Invalid forest configuration")?;

        Ok(config)
    }

    pub fn table_columns(&self) -> TableColumns {
        TableColumns::new(self.label_column.clone(), self.sample_column.clone())
    }
}

/// Load model settings from a JSON file.
pub fn load_model_settings<P: AsRef<Path>>(path: P) -> Result<ModelSettings> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let settings: ModelSettings = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(settings)
}

pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("Not a regular file: {}", path.display());
    }
    Ok(())
}
