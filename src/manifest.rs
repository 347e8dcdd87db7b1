// SPDX-License-Identifier: Apache-2.0

//! Reads the optional `PulumiPlugin.yaml` manifest dropped inside a plugin's
//! extracted directory, used to drive runtime dependency bootstrap.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

pub const MANIFEST_FILE_NAME: &str = "PulumiPlugin.yaml";

/// Runtime a plugin needs bootstrapped after extraction. Unknown runtimes
/// are tolerated at parse time (stored verbatim) so a manifest written for
/// a newer schema doesn't fail an older reader outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runtime {
	Nodejs,
	Python,
	Other(String),
}

impl<'de> Deserialize<'de> for Runtime {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		Ok(match raw.to_ascii_lowercase().as_str() {
			"nodejs" => Runtime::Nodejs,
			"python" => Runtime::Python,
			_ => Runtime::Other(raw),
		})
	}
}

/// The `runtime:` block of a manifest: the runtime's name plus whatever
/// free-form options it declares (e.g. a nodejs plugin's `typescript` flag).
/// `options` is opaque to this crate — it's read and handed to the runtime's
/// own dependency installer, never interpreted here.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuntimeInfo {
	pub name: Runtime,
	#[serde(default)]
	pub options: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct PluginManifest {
	pub runtime: Option<RuntimeInfo>,
	#[serde(default)]
	pub resource: bool,
	pub name: Option<String>,
	pub version: Option<String>,
}

/// Reads and parses the manifest from `plugin_dir`, if one is present.
/// Absence is not an error — most plugins have no runtime dependencies to
/// bootstrap.
pub fn read(plugin_dir: &Path) -> Result<Option<PluginManifest>> {
	let manifest_path = plugin_dir.join(MANIFEST_FILE_NAME);
	if !manifest_path.exists() {
		return Ok(None);
	}

	let contents = std::fs::read_to_string(&manifest_path).map_err(|e| crate::error::PluginStoreError::filesystem(&manifest_path, e))?;
	let manifest: PluginManifest = serde_yaml::from_str(&contents)?;
	Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn missing_manifest_is_not_an_error() {
		let tmp = TempDir::new().unwrap();
		assert_eq!(read(tmp.path()).unwrap(), None);
	}

	#[test]
	fn parses_nodejs_runtime_manifest() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join(MANIFEST_FILE_NAME), "runtime:\n  name: nodejs\n  options: {}\n").unwrap();
		let manifest = read(tmp.path()).unwrap().unwrap();
		assert_eq!(manifest.runtime.as_ref().map(|r| &r.name), Some(&Runtime::Nodejs));
		assert!(manifest.runtime.unwrap().options.is_empty());
	}

	#[test]
	fn parses_runtime_options() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(
			tmp.path().join(MANIFEST_FILE_NAME),
			"runtime:\n  name: nodejs\n  options:\n    typescript: true\n    packagemanager: yarn\n",
		)
		.unwrap();
		let manifest = read(tmp.path()).unwrap().unwrap();
		let runtime = manifest.runtime.unwrap();
		assert_eq!(runtime.name, Runtime::Nodejs);
		assert_eq!(runtime.options.get("typescript").and_then(|v| v.as_bool()), Some(true));
		assert_eq!(runtime.options.get("packagemanager").and_then(|v| v.as_str()), Some("yarn"));
	}

	#[test]
	fn parses_full_manifest() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(
			tmp.path().join(MANIFEST_FILE_NAME),
			"runtime:\n  name: python\nresource: true\nname: aws\nversion: 1.2.3\n",
		)
		.unwrap();
		let manifest = read(tmp.path()).unwrap().unwrap();
		assert_eq!(manifest.runtime.as_ref().map(|r| &r.name), Some(&Runtime::Python));
		assert!(manifest.resource);
		assert_eq!(manifest.name.as_deref(), Some("aws"));
	}
}
