// SPDX-License-Identifier: Apache-2.0

//! The crash-safe install state machine: acquire the per-plugin lock, clean
//! up after any previous crash, extract the archive directly into the
//! final directory, bootstrap runtime dependencies, and always release the
//! lock on the way out.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::cache::{self, lock_file_path, partial_marker_path};
use crate::error::{PluginStoreError, Result};
use crate::extract::Extractor;
use crate::identity::PluginInfo;
use crate::lock::InstallLock;
use crate::manifest::{self, Runtime};
use crate::runtime_bootstrap::DependencyInstaller;

/// Installs `plugin` into `cache_root`, under the per-plugin lock, reading
/// its archive from `archive` as it streams in rather than buffering it
/// whole — `archive` is typically a download's HTTP body, piped straight
/// into the extractor.
///
/// If the directory already exists and has no `.partial` marker, this is a
/// no-op success unless `reinstall` is set. If a `.partial` marker is
/// present, the previous attempt is assumed to have crashed and the
/// directory is wiped before re-extracting.
pub fn install(
	extractor: &dyn Extractor,
	dependency_installer: &dyn DependencyInstaller,
	cache_root: &Path,
	plugin: &PluginInfo,
	archive: &mut dyn Read,
	reinstall: bool,
) -> Result<()> {
	assert!(plugin.version.is_some(), "install requires a versioned plugin");

	let dir_name = plugin.dir_name();
	let dir = cache_root.join(&dir_name);
	let partial = partial_marker_path(cache_root, &dir_name);
	let lock_path = lock_file_path(cache_root, &dir_name);

	log::debug!("waiting for install lock at {}", lock_path.display());
	let _lock = InstallLock::acquire(&lock_path)?;

	cache::cleanup_legacy_temp_dirs(cache_root);

	if dir.is_dir() {
		let crashed = partial.exists();
		if crashed {
			log::warn!("found partial install marker for '{dir_name}'; a previous install must have crashed, reinstalling");
		}
		if crashed || reinstall {
			fs::remove_dir_all(&dir).map_err(|e| PluginStoreError::filesystem(&dir, e))?;
		} else {
			log::debug!("'{dir_name}' is already installed, skipping");
			return Ok(());
		}
	}

	extract_into(extractor, dependency_installer, &dir, &partial, archive)
}

fn extract_into(extractor: &dyn Extractor, dependency_installer: &dyn DependencyInstaller, dir: &Path, partial: &Path, archive: &mut dyn Read) -> Result<()> {
	fs::write(partial, []).map_err(|e| PluginStoreError::filesystem(partial, e))?;

	create_plugin_dir(dir)?;

	extractor
		.extract(archive, dir)
		.and_then(|()| bootstrap_if_needed(dependency_installer, dir))?;

	fs::remove_file(partial).map_err(|e| PluginStoreError::filesystem(partial, e))?;
	Ok(())
}

fn bootstrap_if_needed(dependency_installer: &dyn DependencyInstaller, dir: &Path) -> Result<()> {
	let Some(manifest) = manifest::read(dir)? else {
		return Ok(());
	};
	let Some(runtime) = &manifest.runtime else {
		return Ok(());
	};
	match &runtime.name {
		Runtime::Nodejs | Runtime::Python => dependency_installer.install(&runtime.name, dir),
		Runtime::Other(_) => Ok(()),
	}
}

#[cfg(unix)]
fn create_plugin_dir(dir: &Path) -> Result<()> {
	use std::os::unix::fs::DirBuilderExt;
	std::fs::DirBuilder::new().mode(0o700).create(dir).map_err(|e| PluginStoreError::filesystem(dir, e))
}

#[cfg(not(unix))]
fn create_plugin_dir(dir: &Path) -> Result<()> {
	std::fs::create_dir(dir).map_err(|e| PluginStoreError::filesystem(dir, e))
}

/// Removes an installed plugin's directory and, best-effort, its sentinel
/// files. Succeeds only if the directory removal succeeded; sentinel
/// cleanup failures are swallowed since they're cosmetic once the
/// directory is gone.
pub fn delete(cache_root: &Path, plugin: &PluginInfo) -> Result<()> {
	let dir_name = plugin.dir_name();
	let dir = cache_root.join(&dir_name);
	let partial = partial_marker_path(cache_root, &dir_name);
	let lock_path = lock_file_path(cache_root, &dir_name);

	fs::remove_dir_all(&dir).map_err(|e| PluginStoreError::filesystem(&dir, e))?;

	remove_sentinel_best_effort(&partial);
	remove_sentinel_best_effort(&lock_path);

	Ok(())
}

fn remove_sentinel_best_effort(path: &Path) {
	if let Err(e) = fs::remove_file(path) {
		if e.kind() != std::io::ErrorKind::NotFound {
			log::trace!("failed to remove sentinel file {}: {e}", path.display());
		}
	}
}
