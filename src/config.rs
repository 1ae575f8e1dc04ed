use crate::error::{Error, Result};
use crate::tree::TreeStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub outline: OutlineConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Sizing and addressing used when rendering documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Base spacing unit in px; heading margins and list indentation scale from it
    #[serde(default = "default_layout_unit")]
    pub layout_unit: f64,

    /// Base font size in px
    #[serde(default = "default_text_unit")]
    pub text_unit: f64,

    /// Prefix turning an ipfs content id into a fetchable URL
    #[serde(default = "default_ipfs_blob_prefix")]
    pub ipfs_blob_prefix: String,

    /// Web gateway used for the href of hypermedia links
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Clip documents to this many blocks before rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_block_count: Option<usize>,

    /// Syntax highlight code blocks with a known language
    #[serde(default = "default_highlight_code")]
    pub highlight_code: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            layout_unit: default_layout_unit(),
            text_unit: default_text_unit(),
            ipfs_blob_prefix: default_ipfs_blob_prefix(),
            gateway_url: default_gateway_url(),
            max_block_count: None,
            highlight_code: default_highlight_code(),
        }
    }
}

fn default_layout_unit() -> f64 {
    24.0
}

fn default_text_unit() -> f64 {
    18.0
}

fn default_ipfs_blob_prefix() -> String {
    "http://localhost:55001/ipfs/".to_string()
}

fn default_gateway_url() -> String {
    "https://hyper.media".to_string()
}

fn default_highlight_code() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineConfig {
    /// Tree rendering style: "compact" (default, gapless) or "spaced"
    #[serde(default = "default_tree_style")]
    pub tree_style: String,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            tree_style: default_tree_style(),
        }
    }
}

fn default_tree_style() -> String {
    "compact".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/hmtree/config.toml
    /// - Linux: ~/.config/hmtree/config.toml
    /// - Windows: %APPDATA%/hmtree/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hmtree").join("config.toml"))
    }

    /// Load config from file, or return default if file doesn't exist
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from `path`. A missing or unparsable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unparsable config");
            Self::default()
        })
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(Error::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Parse tree style, falling back to compact
    pub fn tree_style(&self) -> TreeStyle {
        self.outline.tree_style.parse().unwrap_or(TreeStyle::Compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.render.layout_unit, 24.0);
        assert_eq!(config.render.text_unit, 18.0);
        assert!(config.render.highlight_code);
        assert_eq!(config.render.max_block_count, None);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.tree_style(), TreeStyle::Compact);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[render]
text_unit = 16.0

[outline]
tree_style = "spaced"
"#,
        )
        .unwrap();
        assert_eq!(config.render.text_unit, 16.0);
        assert_eq!(config.render.layout_unit, 24.0);
        assert_eq!(config.render.gateway_url, "https://hyper.media");
        assert_eq!(config.tree_style(), TreeStyle::Spaced);
    }

    #[test]
    fn test_unknown_tree_style_falls_back() {
        let mut config = Config::default();
        config.outline.tree_style = "zigzag".into();
        assert_eq!(config.tree_style(), TreeStyle::Compact);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.render.max_block_count = Some(50);
        config.log.level = "debug".into();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")), Config::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "render = [").unwrap();
        assert_eq!(Config::load_from(&broken), Config::default());
    }
}
