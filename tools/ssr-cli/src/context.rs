//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use ssr_sdk::ssr_core::SsrConfig;

use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["ssr.toml", ".ssr.toml", "ssr.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Loaded manifest.
    pub config: SsrConfig,
    /// Where the manifest came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
}

impl Context {
    /// Load context from an explicit manifest or the nearest one found.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let (config, config_path) = match config_path {
            Some(path) => {
                let config = SsrConfig::load(path)
                    .with_context(|| format!("Failed to load config from {}", path))?;
                (config, Some(PathBuf::from(path)))
            }
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                match find_config(&cwd) {
                    Some(path) => {
                        let config = SsrConfig::load(&path).with_context(|| {
                            format!("Failed to load config from {}", path.display())
                        })?;
                        (config, Some(path))
                    }
                    None => (SsrConfig::default(), None),
                }
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
        })
    }
}

/// Find a manifest in the directory tree, nearest first.
fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_up() {
        let root = std::env::temp_dir().join(format!("ssr-cli-ctx-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("ssr.toml"), "").unwrap();

        assert_eq!(find_config(&nested), Some(root.join("ssr.toml")));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let result = Context::load(Some("/nonexistent/ssr.toml"), Output::new(false, false));
        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to load config"));
    }
}
