// SPDX-License-Identifier: Apache-2.0

//! Enumerates installed plugins under a cache root, filtering out anything
//! partially installed or mid-rename.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::Result;
use crate::identity::{parse_tolerant_version, PluginInfo, PluginKind};

/// `^([a-z]+)-([a-zA-Z0-9-]*[a-zA-Z0-9])-v(.*)$`
fn canonical_name_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"^([a-z]+)-([a-zA-Z0-9-]*[a-zA-Z0-9])-v(.*)$").expect("static regex is valid"))
}

/// Directories left behind mid-rename by an older version of the installer.
fn in_flight_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"\.tmp[0-9]+$").expect("static regex is valid"))
}

pub fn partial_marker_path(cache_root: &Path, dir_name: &str) -> std::path::PathBuf {
	cache_root.join(format!("{dir_name}.partial"))
}

pub fn lock_file_path(cache_root: &Path, dir_name: &str) -> std::path::PathBuf {
	cache_root.join(format!("{dir_name}.lock"))
}

/// Removes directories left behind by an older installer mid-rename
/// (`<dir>.tmpNNN`). Best-effort: a single entry failing to remove is
/// logged and skipped rather than aborting the whole sweep.
pub fn cleanup_legacy_temp_dirs(cache_root: &Path) {
	let Ok(entries) = fs::read_dir(cache_root) else {
		return;
	};

	for entry in entries.flatten() {
		let path = entry.path();
		let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
			continue;
		};
		if !in_flight_regex().is_match(file_name) {
			continue;
		}
		log::warn!("removing legacy in-flight install directory '{file_name}'");
		if let Err(e) = fs::remove_dir_all(&path) {
			log::warn!("failed to remove legacy temp directory '{file_name}': {e}");
		}
	}
}

/// Whether `install_dir` looks installed: the directory exists and its
/// sibling `.partial` marker does not.
pub fn is_installed(cache_root: &Path, dir_name: &str) -> bool {
	cache_root.join(dir_name).is_dir() && !partial_marker_path(cache_root, dir_name).exists()
}

/// Enumerate the immediate children of `cache_root`. Returns an empty list
/// (not an error) if the cache root doesn't exist yet. When
/// `with_metadata` is set, also computes directory size and filesystem
/// timestamps for each entry (an extra recursive walk per entry, so this is
/// opt-in).
pub fn scan(cache_root: &Path, with_metadata: bool) -> Result<Vec<PluginInfo>> {
	if !cache_root.exists() {
		return Ok(Vec::new());
	}

	let mut out = Vec::new();
	for entry in fs::read_dir(cache_root).map_err(|e| crate::error::PluginStoreError::filesystem(cache_root, e))? {
		let entry = entry.map_err(|e| crate::error::PluginStoreError::filesystem(cache_root, e))?;
		let path = entry.path();

		if !path.is_dir() {
			continue;
		}

		let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
			continue;
		};

		if in_flight_regex().is_match(file_name) {
			log::trace!("cache scan: skipping in-flight entry '{file_name}'");
			continue;
		}

		let Some(captures) = canonical_name_regex().captures(file_name) else {
			log::trace!("cache scan: skipping non-canonical entry '{file_name}'");
			continue;
		};

		let Ok(kind) = captures[1].parse::<PluginKind>() else {
			log::trace!("cache scan: skipping entry with unknown kind '{file_name}'");
			continue;
		};

		let name = captures[2].to_owned();
		let version_str = &captures[3];
		let version = match parse_tolerant_version(version_str) {
			Ok(v) => v,
			Err(_) => {
				log::trace!("cache scan: skipping entry with unparseable version '{file_name}'");
				continue;
			}
		};

		if partial_marker_path(cache_root, file_name).exists() {
			log::trace!("cache scan: skipping partially-installed entry '{file_name}'");
			continue;
		}

		let mut info = PluginInfo::new(kind, name, Some(version));
		info.path = Some(path.clone());

		if with_metadata {
			info.size = Some(directory_size(&path));
			let metadata = fs::metadata(&path).ok();
			info.install_time = metadata
				.as_ref()
				.and_then(|m| m.created().ok())
				.or(Some(SystemTime::UNIX_EPOCH));
			info.last_used_time = metadata.and_then(|m| m.accessed().ok());
		}

		out.push(info);
	}

	Ok(out)
}

fn directory_size(path: &Path) -> u64 {
	WalkDir::new(path)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.filter_map(|e| e.metadata().ok())
		.map(|m| m.len())
		.sum()
}
