// SPDX-License-Identifier: Apache-2.0

//! An advisory, cross-process, per-plugin install lock backed by a `.lock`
//! sentinel file. Guards against two concurrent installers racing to write
//! into the same final directory.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs3::FileExt;

use crate::error::{PluginStoreError, Result};

/// Held for the duration of an install. Blocks (via a real OS file lock,
/// not a busy loop) until any other process's guard for the same path is
/// dropped, then releases automatically on drop.
pub struct InstallLock {
	path: PathBuf,
	file: File,
}

impl InstallLock {
	/// Opens (creating if necessary) the lock file at `lock_path` and blocks
	/// until an exclusive lock on it is acquired.
	pub fn acquire(lock_path: &Path) -> Result<Self> {
		if let Some(parent) = lock_path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| PluginStoreError::filesystem(parent, e))?;
		}

		let file = OpenOptions::new()
			.create(true)
			.truncate(false)
			.write(true)
			.open(lock_path)
			.map_err(|e| PluginStoreError::filesystem(lock_path, e))?;

		log::debug!("acquiring install lock at {}", lock_path.display());
		file.lock_exclusive().map_err(|e| PluginStoreError::filesystem(lock_path, e))?;

		Ok(InstallLock {
			path: lock_path.to_owned(),
			file,
		})
	}

	/// Attempts to acquire the lock without blocking. Returns `Ok(None)` if
	/// another process currently holds it.
	pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>> {
		if let Some(parent) = lock_path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| PluginStoreError::filesystem(parent, e))?;
		}

		let file = OpenOptions::new()
			.create(true)
			.truncate(false)
			.write(true)
			.open(lock_path)
			.map_err(|e| PluginStoreError::filesystem(lock_path, e))?;

		match file.try_lock_exclusive() {
			Ok(()) => Ok(Some(InstallLock {
				path: lock_path.to_owned(),
				file,
			})),
			Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
			Err(e) => Err(PluginStoreError::filesystem(lock_path, e)),
		}
	}
}

impl Drop for InstallLock {
	fn drop(&mut self) {
		if let Err(e) = self.file.unlock() {
			log::warn!("failed to release install lock at {}: {e}", self.path.display());
		}
	}
}
