// SPDX-License-Identifier: Apache-2.0

//! Plugin identity: the closed kind enum, the name/path conventions, and the
//! descriptive (non-owning) [`PluginInfo`] record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

use crate::error::{PluginStoreError, Result};

/// Closed set of plugin kinds. Any other string is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginKind {
	Analyzer,
	Language,
	Resource,
}

impl PluginKind {
	pub const ALL: [PluginKind; 3] = [PluginKind::Analyzer, PluginKind::Language, PluginKind::Resource];

	pub fn as_str(&self) -> &'static str {
		match self {
			PluginKind::Analyzer => "analyzer",
			PluginKind::Language => "language",
			PluginKind::Resource => "resource",
		}
	}
}

impl fmt::Display for PluginKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for PluginKind {
	type Err = ();

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"analyzer" => Ok(PluginKind::Analyzer),
			"language" => Ok(PluginKind::Language),
			"resource" => Ok(PluginKind::Resource),
			_ => Err(()),
		}
	}
}

/// Name rule: `[a-zA-Z0-9-]*[a-zA-Z0-9]` — no empty names, no trailing hyphen.
fn name_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-]*[a-zA-Z0-9]$").expect("static regex is valid"))
}

pub fn is_valid_plugin_name(name: &str) -> bool {
	!name.is_empty() && name_regex().is_match(name)
}

/// Tolerant semver parse: a leading `v` is stripped, and missing
/// minor/patch components are filled with zero.
pub fn parse_tolerant_version(raw: &str) -> Result<Version> {
	let trimmed = raw.strip_prefix('v').unwrap_or(raw);
	if let Ok(v) = Version::parse(trimmed) {
		return Ok(v);
	}

	// Fill in missing components: "1" -> "1.0.0", "1.2" -> "1.2.0".
	let dot_count = trimmed.chars().filter(|c| *c == '.').count();
	let filled = match dot_count {
		0 => format!("{trimmed}.0.0"),
		1 => format!("{trimmed}.0"),
		_ => trimmed.to_owned(),
	};
	Version::parse(&filled).map_err(|e| PluginStoreError::InvalidVersion {
		raw: raw.to_owned(),
		reason: format!("not a valid version: {e}"),
	})
}

/// The identity and metadata record for a plugin. Descriptive, non-owning:
/// the filesystem is the source of truth, this is a view over it.
#[derive(Debug, Clone)]
pub struct PluginInfo {
	pub name: String,
	pub kind: PluginKind,
	pub version: Option<Version>,
	pub path: Option<PathBuf>,
	pub size: Option<u64>,
	pub install_time: Option<SystemTime>,
	pub last_used_time: Option<SystemTime>,
	pub plugin_download_url: Option<String>,
	pub plugin_dir: Option<PathBuf>,
}

impl PluginInfo {
	pub fn new(kind: PluginKind, name: impl Into<String>, version: Option<Version>) -> Self {
		PluginInfo {
			name: name.into(),
			kind,
			version,
			path: None,
			size: None,
			install_time: None,
			last_used_time: None,
			plugin_download_url: None,
			plugin_dir: None,
		}
	}

	pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
		self.plugin_download_url = Some(url.into());
		self
	}

	pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.plugin_dir = Some(dir.into());
		self
	}

	/// `"<kind>-<name>"`, or `"<kind>-<name>-v<version>"` when a version is set.
	pub fn dir_name(&self) -> String {
		dir_name(self.kind, &self.name, self.version.as_ref())
	}

	/// `"pulumi-<kind>-<name>"` plus the platform executable suffix.
	pub fn executable_name(&self) -> String {
		executable_name(self.kind, &self.name)
	}
}

pub fn dir_name(kind: PluginKind, name: &str, version: Option<&Version>) -> String {
	match version {
		Some(v) => format!("{kind}-{name}-v{v}"),
		None => format!("{kind}-{name}"),
	}
}

pub fn executable_name(kind: PluginKind, name: &str) -> String {
	format!("pulumi-{kind}-{name}{}", executable_suffix())
}

#[cfg(target_os = "windows")]
pub fn executable_suffix() -> &'static str {
	".exe"
}

#[cfg(not(target_os = "windows"))]
pub fn executable_suffix() -> &'static str {
	""
}

/// `<userConfigRoot>/plugins`, unless `plugin_dir` overrides it. Fails
/// explicitly (never falls back to CWD) when the user config root can't be
/// determined.
pub fn default_cache_root(plugin_dir: Option<&Path>) -> Result<PathBuf> {
	if let Some(dir) = plugin_dir {
		return Ok(dir.to_owned());
	}
	let config_root = dirs::config_dir().ok_or_else(|| {
		PluginStoreError::filesystem(
			PathBuf::from("<user config root>"),
			std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine user config directory"),
		)
	})?;
	Ok(config_root.join("plugins"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn name_validation() {
		assert!(is_valid_plugin_name("aws"));
		assert!(is_valid_plugin_name("aws-native"));
		assert!(is_valid_plugin_name("a1"));
		assert!(!is_valid_plugin_name(""));
		assert!(!is_valid_plugin_name("-aws"));
		assert!(!is_valid_plugin_name("aws-"));
	}

	#[test]
	fn tolerant_version_parse() {
		assert_eq!(parse_tolerant_version("v1.2.3").unwrap(), Version::parse("1.2.3").unwrap());
		assert_eq!(parse_tolerant_version("1.2").unwrap(), Version::parse("1.2.0").unwrap());
		assert_eq!(parse_tolerant_version("1").unwrap(), Version::parse("1.0.0").unwrap());
		assert_eq!(parse_tolerant_version("v2.0.0-beta").unwrap(), Version::parse("2.0.0-beta").unwrap());
	}

	#[test]
	fn unparseable_version_is_reported_as_invalid_version_not_invalid_override() {
		let err = parse_tolerant_version("not-a-version").unwrap_err();
		assert!(matches!(err, PluginStoreError::InvalidVersion { .. }));
	}

	#[test]
	fn dir_name_with_and_without_version() {
		let v = Version::parse("1.2.3").unwrap();
		assert_eq!(dir_name(PluginKind::Resource, "aws", Some(&v)), "resource-aws-v1.2.3");
		assert_eq!(dir_name(PluginKind::Resource, "aws", None), "resource-aws");
	}

	#[test]
	fn kind_round_trips_through_display_and_from_str() {
		for kind in PluginKind::ALL {
			assert_eq!(kind.to_string().parse::<PluginKind>().unwrap(), kind);
		}
	}
}
