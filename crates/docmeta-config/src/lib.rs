//! Compiler configuration (`docmeta.toml`) and raw class file loading.

use docmeta_schema::{CompileError, NameRegistry, RawSchema, Schema, compile};
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;
use tracing::{debug, info};

/// Config file looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "docmeta.toml";

/// Descriptor name used when the config does not set `factory`.
pub const DEFAULT_FACTORY_NAME: &str = "MetadataFactory";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(
        "class '{class}' is declared in both '{}' and '{}'",
        .first.display(),
        .second.display()
    )]
    DuplicateClass {
        class: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid JSON in '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("'{}' must declare a map of class name to declaration", .path.display())]
    NotAMap { path: PathBuf },

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in '{}': {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unsupported class file '{}', expected .json or .toml", .path.display())]
    UnsupportedExtension { path: PathBuf },
}

///
/// Config
///
/// Relative paths are resolved against the directory of the config file.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub classes: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub factory: Option<String>,
    pub types: RegistryConfig,
    pub id_generators: RegistryConfig,

    #[serde(skip)]
    base_dir: PathBuf,
}

///
/// RegistryConfig
/// Names added on top of a built-in registry.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub extra: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        info!(
            path = %path.display(),
            class_files = config.classes.len(),
            "config loaded"
        );

        Ok(config.with_base_dir(base_dir))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    #[must_use]
    pub fn factory_name(&self) -> &str {
        self.factory.as_deref().unwrap_or(DEFAULT_FACTORY_NAME)
    }

    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_deref().map(|output| self.resolve(output))
    }

    #[must_use]
    pub fn type_registry(&self) -> NameRegistry {
        let mut registry = NameRegistry::builtin_types();
        registry.extend(self.types.extra.iter().cloned());
        registry
    }

    #[must_use]
    pub fn id_generator_registry(&self) -> NameRegistry {
        let mut registry = NameRegistry::builtin_id_generators();
        registry.extend(self.id_generators.extra.iter().cloned());
        registry
    }

    /// Read every class file, in the order listed, into one raw schema.
    pub fn load_classes(&self) -> Result<RawSchema, ConfigError> {
        let mut raw = RawSchema::new();
        let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

        for file in &self.classes {
            let path = self.resolve(file);

            for (class, declaration) in load_class_file(&path)? {
                if let Some(first) = sources.get(&class) {
                    return Err(ConfigError::DuplicateClass {
                        class,
                        first: first.clone(),
                        second: path,
                    });
                }
                sources.insert(class.clone(), path.clone());
                raw.insert(class, declaration);
            }
        }

        Ok(raw)
    }

    /// Load the class files and compile them against the configured registries.
    pub fn compile(&self) -> Result<Schema, ConfigError> {
        let raw = self.load_classes()?;
        let schema = compile(&raw, &self.type_registry(), &self.id_generator_registry())?;

        Ok(schema)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Read one class file; the format follows the extension.
pub fn load_class_file(path: &Path) -> Result<RawSchema, ConfigError> {
    let text = read(path)?;

    let value: Value = match path.extension().and_then(OsStr::to_str) {
        Some("json") => serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Some("toml") => toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        _ => {
            return Err(ConfigError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
    };

    let Value::Object(classes) = value else {
        return Err(ConfigError::NotAMap {
            path: path.to_path_buf(),
        });
    };
    debug!(path = %path.display(), classes = classes.len(), "class file loaded");

    Ok(classes.into_iter().collect())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
