//! Multi-file configuration loading.
//!
//! The main file may name other files in `include`. Included files contribute
//! whole top-level sections; a section defined twice is an error, as is an
//! included file that itself has an `include`.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub(crate) struct ConfigLoader {
	/// Relative includes are resolved against this directory.
	base_path: PathBuf,
	/// Canonical paths already read, for cycle detection.
	loaded_files: HashSet<PathBuf>,
	/// File that defined each top-level section.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub(crate) fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads `config_path` and its includes into a validated [`Config`].
	pub(crate) async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let main_path = self.resolve_path(config_path)?;
		let mut combined = self.load_table(&main_path).await?;

		let includes = match combined.remove("include") {
			Some(value) => Self::include_paths(value)?,
			None => Vec::new(),
		};
		self.record_sections(&combined, &main_path)?;

		for include in includes {
			let include_path = self.resolve_path(&include)?;
			let table = self.load_table(&include_path).await?;
			if table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested include in {} is not supported",
					include_path.display()
				)));
			}
			self.record_sections(&table, &include_path)?;
			for (key, value) in table {
				combined.insert(key, value);
			}
		}

		let merged = toml::to_string(&toml::Value::Table(combined)).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		merged.parse()
	}

	/// Reads a file, resolves environment variables and parses it as a table.
	async fn load_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn include_paths(value: toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		match value {
			toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
			toml::Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					toml::Value::String(path) => Ok(PathBuf::from(path)),
					_ => Err(ConfigError::Validation(
						"Include array must contain only strings".into(),
					)),
				})
				.collect(),
			_ => Err(ConfigError::Validation(
				"Include must be a string or array of strings".into(),
			)),
		}
	}

	fn record_sections(&mut self, table: &toml::Table, source: &Path) -> Result<(), ConfigError> {
		for key in table.keys() {
			if let Some(existing) = self.section_sources.get(key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}",
					key,
					existing.display(),
					source.display()
				)));
			}
			self.section_sources.insert(key.clone(), source.to_path_buf());
		}
		Ok(())
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}
