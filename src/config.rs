//! Configuration for vec2graph
//!
//! All tuning knobs travel in an explicit [`VizOptions`] struct handed to
//! the extractor and emitter; nothing is read from global state. Defaults
//! can be overridden by an optional `.vec2graph.toml` file discovered by
//! walking up from the working directory, and CLI flags override the file.
//!
//! ## Configuration file format
//!
//! ```toml
//! # .vec2graph.toml
//!
//! [options]
//! # Neighbors to extract per word
//! topn = 10
//!
//! # Neighbor-of-neighbor recursion depth (0 = seed word only)
//! depth = 0
//!
//! # Similarity cutoff: [0, 1) as cosine, [1, 100] as percent
//! threshold = 0.0
//!
//! # Stroke width of rendered edges
//! edge_width = 1
//!
//! # Show only the part of a token before "_" (e.g. strip PoS tags)
//! split_separator = false
//!
//! # Where pages load D3 from: "web" or "local"
//! library = "web"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Where generated pages load the D3 rendering library from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSource {
    /// Reference the hosted copy at d3js.org.
    #[default]
    Web,
    /// Reference a copy next to the pages, downloading it once if missing.
    Local,
}

/// Tuning knobs for one visualization run.
///
/// `depth` and `topn` double as resource bounds: expansion issues up to
/// O(topn^depth) oracle queries because the traversal is bounded by depth,
/// not by a visited-set.
#[derive(Debug, Clone, PartialEq)]
pub struct VizOptions {
    /// Neighbor-of-neighbor recursion depth; 0 expands only the seed word.
    pub depth: usize,
    /// Neighbors requested per word.
    pub topn: usize,
    /// Raw similarity cutoff; `[0, 1)` is a cosine value, `[1, 100]` a
    /// percentage (so `1` means 1%). Normalized and validated at
    /// visualization time.
    pub threshold: f32,
    /// Stroke width of rendered edges.
    pub edge_width: u32,
    /// Split tokens on `_` in the rendering, showing only the first part.
    pub split_separator: bool,
    /// Source of the D3 rendering asset.
    pub asset_source: AssetSource,
}

impl Default for VizOptions {
    fn default() -> Self {
        Self {
            depth: 0,
            topn: 10,
            threshold: 0.0,
            edge_width: 1,
            split_separator: false,
            asset_source: AssetSource::Web,
        }
    }
}

/// `[options]` section of the config file; every field optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OptionsConfig {
    pub depth: Option<usize>,
    pub topn: Option<usize>,
    pub threshold: Option<f32>,
    pub edge_width: Option<u32>,
    pub split_separator: Option<bool>,
    pub library: Option<AssetSource>,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub options: OptionsConfig,
}

impl FileConfig {
    /// Fold file-provided values over `base`, returning the result.
    pub fn apply(&self, base: VizOptions) -> VizOptions {
        VizOptions {
            depth: self.options.depth.unwrap_or(base.depth),
            topn: self.options.topn.unwrap_or(base.topn),
            threshold: self.options.threshold.unwrap_or(base.threshold),
            edge_width: self.options.edge_width.unwrap_or(base.edge_width),
            split_separator: self.options.split_separator.unwrap_or(base.split_separator),
            asset_source: self.options.library.unwrap_or(base.asset_source),
        }
    }
}

/// Load configuration, searching `start_path` and its parents.
///
/// Returns defaults when no config file exists.
pub fn load_config(start_path: &Path) -> Result<FileConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        }
        None => Ok(FileConfig::default()),
    }
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".vec2graph.toml", "vec2graph.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = VizOptions::default();
        assert_eq!(options.topn, 10);
        assert_eq!(options.depth, 0);
        assert_eq!(options.threshold, 0.0);
        assert_eq!(options.edge_width, 1);
        assert!(!options.split_separator);
        assert_eq!(options.asset_source, AssetSource::Web);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [options]
            topn = 7
            depth = 2
            threshold = 35.0
            library = "local"
        "#;

        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.options.topn, Some(7));
        assert_eq!(config.options.depth, Some(2));
        assert_eq!(config.options.threshold, Some(35.0));
        assert_eq!(config.options.library, Some(AssetSource::Local));
        assert_eq!(config.options.edge_width, None);
    }

    #[test]
    fn test_apply_keeps_base_for_missing_fields() {
        let config: FileConfig = toml::from_str("[options]\ntopn = 3\n").unwrap();
        let options = config.apply(VizOptions::default());

        assert_eq!(options.topn, 3);
        assert_eq!(options.depth, 0);
        assert_eq!(options.edge_width, 1);
    }

    #[test]
    fn test_load_config_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.options.topn.is_none());
    }

    #[test]
    fn test_load_config_finds_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".vec2graph.toml"), "[options]\ndepth = 1\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.options.depth, Some(1));
    }
}
