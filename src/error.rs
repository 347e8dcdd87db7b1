// SPDX-License-Identifier: Apache-2.0

//! The closed set of error kinds this crate returns.
//!
//! Callers match on [`PluginStoreError`] variants rather than parsing
//! message strings, so keep new failure modes as variants here instead of
//! burying them inside an existing one.

use std::path::PathBuf;

use crate::identity::PluginKind;

pub type Result<T> = std::result::Result<T, PluginStoreError>;

#[derive(Debug, thiserror::Error)]
pub enum PluginStoreError {
	#[error("{}", missing_plugin_message(kind, name, version, *ambient_searched))]
	MissingPlugin {
		kind: PluginKind,
		name: String,
		version: Option<semver::VersionReq>,
		ambient_searched: bool,
	},

	#[error("unsupported platform: os='{os}' arch='{arch}'")]
	UnsupportedPlatform { os: String, arch: String },

	#[error("invalid plugin download override '{entry}': {reason}")]
	InvalidOverride { entry: String, reason: String },

	#[error("invalid version '{raw}': {reason}")]
	InvalidVersion { raw: String, reason: String },

	#[error("could not download from {url}: {detail}")]
	SourceUnavailable { url: String, detail: String },

	#[error("release '{tag}' has no asset named '{asset_name}'")]
	AssetNotFound { tag: String, asset_name: String },

	#[error("source does not support latest-version lookup")]
	LatestNotSupported,

	#[error("filesystem error at '{}': {source}", path.display())]
	FilesystemError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("no installed {kind} plugin '{name}' satisfies {range}")]
	SelectorMismatch {
		kind: PluginKind,
		name: String,
		range: String,
	},

	#[error("invalid plugin manifest: {0}")]
	InvalidManifest(#[from] serde_yaml::Error),

	#[error("malformed release metadata: {0}")]
	InvalidReleaseMetadata(#[from] serde_json::Error),
}

fn missing_plugin_message(
	kind: &PluginKind,
	name: &str,
	version: &Option<semver::VersionReq>,
	ambient_searched: bool,
) -> String {
	let version_part = match version {
		Some(v) => format!(" matching '{v}'"),
		None => String::new(),
	};
	let searched_part = if ambient_searched {
		"the cache or the ambient search path"
	} else {
		"the cache"
	};
	format!("no {kind} plugin '{name}'{version_part} found in {searched_part}; install it first")
}

impl PluginStoreError {
	pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		PluginStoreError::FilesystemError {
			path: path.into(),
			source,
		}
	}
}
