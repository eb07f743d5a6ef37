//! Implementation of the `adaptest init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push("\nDefault configuration written to .adaptest/config.yaml".to_string());
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let result = initialize(&target_path, args.force).await?;
    output(&result, json_mode);
    Ok(())
}

/// Lay out the project directories and the default config under `target_path`.
pub async fn initialize(target_path: &Path, force: bool) -> Result<InitOutput> {
    let defaults = Config::default();
    let data_dir = target_path.join(&defaults.data_dir);

    if data_dir.exists() && !force {
        return Ok(InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path.to_path_buf(),
            directories_created: vec![],
            config_written: false,
        });
    }

    let mut directories_created = vec![];
    let dirs = [
        data_dir.clone(),
        data_dir.join("logs"),
        target_path.join(&defaults.generated_tests_dir),
        target_path.join(&defaults.predictive_tests_dir),
    ];

    for dir in &dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(target_path)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    // Rewriting the config on --force keeps the stores but resets settings.
    let yaml = serde_yaml::to_string(&defaults).context("Failed to serialize default config")?;
    fs::write(data_dir.join("config.yaml"), yaml)
        .await
        .context("Failed to write config.yaml")?;

    Ok(InitOutput {
        success: true,
        message: if force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path.to_path_buf(),
        directories_created,
        config_written: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConfigLoader;

    #[tokio::test]
    async fn test_init_creates_layout_and_loadable_config() {
        let dir = tempfile::tempdir().unwrap();

        let result = initialize(dir.path(), false).await.unwrap();

        assert!(result.success);
        assert!(result.directories_created.contains(&".adaptest".to_string()));
        assert!(dir.path().join("ai_generated_tests").is_dir());
        let config_path = dir.path().join(".adaptest/config.yaml");
        let config = ConfigLoader::load_from_file(config_path).unwrap();
        assert_eq!(config.learning.min_pattern_frequency, 3);
    }

    #[tokio::test]
    async fn test_init_refuses_twice_without_force() {
        let dir = tempfile::tempdir().unwrap();
        initialize(dir.path(), false).await.unwrap();

        let again = initialize(dir.path(), false).await.unwrap();
        assert!(!again.success);

        let forced = initialize(dir.path(), true).await.unwrap();
        assert!(forced.success);
        assert!(forced.directories_created.is_empty());
    }
}
