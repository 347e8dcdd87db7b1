// SPDX-License-Identifier: Apache-2.0

//! End-to-end plugin lookup: ambient process-path search, then bundled
//! co-location alongside the running executable, then the on-disk cache.
//! The three are tried in that order and the first hit wins.

use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};

use crate::cache;
use crate::env;
use crate::error::{PluginStoreError, Result};
use crate::identity::{self, PluginKind};
use crate::selector;

/// The platform-appropriate executable extensions to try when looking for
/// a bundled plugin sibling to the running executable, in preference
/// order.
#[cfg(target_os = "windows")]
const BUNDLED_EXTENSIONS: &[&str] = &[".exe", ".cmd"];
#[cfg(not(target_os = "windows"))]
const BUNDLED_EXTENSIONS: &[&str] = &[""];

/// Resolved location of a plugin: the directory it was installed into
/// (`None` for ambient/bundled matches, which have no cache directory) and
/// the executable to run.
#[derive(Debug, Clone)]
pub struct ResolvedPlugin {
	pub plugin_dir: Option<PathBuf>,
	pub executable_path: PathBuf,
}

/// Plugins that are always searched for ambiently, even when the caller has
/// opted out of ambient search: every `language` plugin, plus the two
/// resource plugins shipped alongside the main executable.
pub fn is_bundled(kind: PluginKind, name: &str) -> bool {
	kind == PluginKind::Language || (kind == PluginKind::Resource && matches!(name, "pulumi-nodejs" | "pulumi-python"))
}

/// Builds the range the version selector should match against from a
/// single optional requested version: a wildcard when none was requested,
/// or an exact-equality range when one was.
fn range_for_requested(version: Option<&Version>) -> VersionReq {
	match version {
		None => VersionReq::STAR,
		Some(v) => VersionReq::parse(&format!("={v}")).expect("an exact version string is always a valid range"),
	}
}

/// Resolves `(kind, name, version)` to a directory + executable path.
///
/// Search order: the process's executable search path (unless opted out,
/// except bundled plugins which are always searched), then — for bundled
/// plugins only — a sibling of the running executable, then the on-disk
/// cache via the version selector.
pub fn resolve(cache_root: &Path, kind: PluginKind, name: &str, version: Option<&Version>) -> Result<ResolvedPlugin> {
	let bundled = is_bundled(kind, name);
	let ambient_enabled = bundled || !env::ambient_plugins_ignored();

	if ambient_enabled {
		let exe_name = identity::executable_name(kind, name);
		if let Ok(path) = which::which(&exe_name) {
			log::debug!("resolved {kind} plugin '{name}' on the ambient search path: {}", path.display());
			return Ok(ResolvedPlugin {
				plugin_dir: None,
				executable_path: path,
			});
		}
	}

	if bundled {
		if let Some(path) = find_bundled_sibling(kind, name)? {
			log::debug!("resolved bundled {kind} plugin '{name}' alongside the running executable: {}", path.display());
			return Ok(ResolvedPlugin {
				plugin_dir: None,
				executable_path: path,
			});
		}
	}

	match resolve_from_cache(cache_root, kind, name, version) {
		Ok(resolved) => Ok(resolved),
		Err(_) => Err(PluginStoreError::MissingPlugin {
			kind,
			name: name.to_owned(),
			version: version.map(|v| range_for_requested(Some(v))),
			ambient_searched: ambient_enabled,
		}),
	}
}

fn resolve_from_cache(cache_root: &Path, kind: PluginKind, name: &str, version: Option<&Version>) -> Result<ResolvedPlugin> {
	let candidates = cache::scan(cache_root, false)?;

	let selected = if env::legacy_plugin_search_enabled() {
		selector::select_legacy(&candidates, kind, name, version)?
	} else {
		let range = range_for_requested(version);
		selector::select(&candidates, kind, name, &range)?
	};

	let dir = selected.path.clone().expect("a cache-scanned plugin always carries its path");
	let executable_path = dir.join(identity::executable_name(kind, name));
	Ok(ResolvedPlugin {
		plugin_dir: Some(dir),
		executable_path,
	})
}

/// Looks for `pulumi-<kind>-<name>[ext]` next to the running executable,
/// after resolving symlinks, trying each platform-appropriate extension in
/// order and verifying the candidate is actually executable.
fn find_bundled_sibling(kind: PluginKind, name: &str) -> Result<Option<PathBuf>> {
	let current_exe = std::env::current_exe().map_err(|e| PluginStoreError::filesystem(PathBuf::from("<current executable>"), e))?;
	let resolved = current_exe.canonicalize().unwrap_or(current_exe);
	let Some(dir) = resolved.parent() else {
		return Ok(None);
	};

	let base_name = identity::executable_name(kind, name);
	let base_name = base_name.strip_suffix(identity::executable_suffix()).unwrap_or(&base_name);

	for ext in BUNDLED_EXTENSIONS {
		let candidate = dir.join(format!("{base_name}{ext}"));
		if is_executable(&candidate) {
			return Ok(Some(candidate));
		}
	}

	Ok(None)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
	use std::os::unix::fs::PermissionsExt;
	std::fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
	path.is_file()
}

/// Pure filesystem check: is `(kind, name, version)` installed right now?
pub fn has_plugin(cache_root: &Path, kind: PluginKind, name: &str, version: &Version) -> bool {
	let dir_name = identity::dir_name(kind, name, Some(version));
	cache::is_installed(cache_root, &dir_name)
}

/// True if `(kind, name, version)` is installed exactly, or — outside
/// legacy mode — if the version selector finds any installed version
/// satisfying `>=version`. In legacy mode, falls back to a direct linear
/// scan for any installed version `>= version` (matching the selector's
/// own legacy rule).
pub fn has_plugin_gte(cache_root: &Path, kind: PluginKind, name: &str, version: &Version) -> Result<bool> {
	if has_plugin(cache_root, kind, name, version) {
		return Ok(true);
	}

	let candidates = cache::scan(cache_root, false)?;

	if env::legacy_plugin_search_enabled() {
		return Ok(selector::select_legacy(&candidates, kind, name, Some(version)).is_ok());
	}

	let range = VersionReq::parse(&format!(">={version}")).expect("a version string is always a valid '>=' range");
	Ok(selector::select(&candidates, kind, name, &range).is_ok())
}
