//! Configuration management for the generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typegen.toml)
//! - Environment variables (TYPEGEN__*)
//!
//! ## Example config file (typegen.toml):
//! ```toml
//! [source]
//! snapshot = "./snapshot.json"
//!
//! [output]
//! dir = "./src/generated"
//! system_dir = "system"
//! shared_module = "shared"
//! validators = true
//! types = true
//! include_system = true
//!
//! [naming]
//! system_prefix = "directus_"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::EmitOptions;
use crate::metadata::SYSTEM_PREFIX;
use crate::output::OutputLayout;

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypegenConfig {
    /// Metadata source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Output tree settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Naming settings
    #[serde(default)]
    pub naming: NamingConfig,
}

/// Metadata source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Schema snapshot file or directory of snapshot fragments
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output root directory
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Subfolder for system collections
    #[serde(default = "default_system_dir")]
    pub system_dir: String,

    /// Stem of the shared definitions module
    #[serde(default = "default_shared_module")]
    pub shared_module: String,

    /// Emit Zod validators
    #[serde(default = "default_true")]
    pub validators: bool,

    /// Emit TypeScript types
    #[serde(default = "default_true")]
    pub types: bool,

    /// Generate system collections too
    #[serde(default = "default_true")]
    pub include_system: bool,
}

/// Naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Raw name prefix of system collections
    #[serde(default = "default_system_prefix")]
    pub system_prefix: String,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_system_dir() -> String {
    "system".to_string()
}

fn default_shared_module() -> String {
    "shared".to_string()
}

fn default_system_prefix() -> String {
    SYSTEM_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            system_dir: default_system_dir(),
            shared_module: default_shared_module(),
            validators: true,
            types: true,
            include_system: true,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            system_prefix: default_system_prefix(),
        }
    }
}

impl TypegenConfig {
    /// Load configuration, with an explicit file layered on top
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["typegen.toml", ".typegen.toml", "config/typegen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "directus", "typegen") {
            let xdg_config = config_dir.config_dir().join("typegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (TYPEGEN__OUTPUT__DIR, ...)
        builder = builder.add_source(
            Environment::with_prefix("TYPEGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            system_dir: self.output.system_dir.clone(),
            shared_module: self.output.shared_module.clone(),
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            validators: self.output.validators,
            types: self.output.types,
        }
    }

    /// Get the output directory (resolves relative paths)
    pub fn output_dir(&self) -> PathBuf {
        if self.output.dir.is_absolute() {
            self.output.dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.dir)
        }
    }
}
