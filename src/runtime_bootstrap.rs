// SPDX-License-Identifier: Apache-2.0

//! Invokes a plugin's runtime dependency installer after extraction, when
//! its manifest declares a recognized runtime. Kept behind a trait, the
//! same way `Extractor` (extract.rs) and `HttpClient` (http.rs) wrap their
//! own external collaborators, so the nodejs/python bootstrap branches can
//! be exercised in tests without shelling out to npm/python3.

use std::path::Path;
use std::process::Command;

use crate::error::{PluginStoreError, Result};
use crate::manifest::Runtime;

/// The dependency-bootstrap seam the installer invokes through after
/// extraction. The real implementation is [`CommandDependencyInstaller`];
/// tests substitute a fake that records which runtime/directory it was
/// asked to bootstrap instead of running a real package manager.
pub trait DependencyInstaller: Send + Sync {
	/// Installs `runtime`'s dependencies inside `plugin_dir`. Only called
	/// for recognized runtimes (`nodejs`, `python`) — the installer never
	/// reaches this trait for `Runtime::Other`.
	fn install(&self, runtime: &Runtime, plugin_dir: &Path) -> Result<()>;
}

/// Shells out to `npm install --production` for `nodejs`, or creates a
/// `venv` and `pip install`s `requirements.txt` for `python`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDependencyInstaller;

impl DependencyInstaller for CommandDependencyInstaller {
	fn install(&self, runtime: &Runtime, plugin_dir: &Path) -> Result<()> {
		match runtime {
			Runtime::Nodejs => run(plugin_dir, "npm", &["install", "--production"]),
			Runtime::Python => run(plugin_dir, "python3", &["-m", "venv", "venv"]).and_then(|_| install_python_requirements(plugin_dir)),
			Runtime::Other(name) => {
				log::trace!("no dependency bootstrap known for runtime '{name}'; skipping");
				Ok(())
			}
		}
	}
}

fn install_python_requirements(plugin_dir: &Path) -> Result<()> {
	if !plugin_dir.join("requirements.txt").exists() {
		return Ok(());
	}
	let pip = if cfg!(target_os = "windows") {
		plugin_dir.join("venv").join("Scripts").join("pip")
	} else {
		plugin_dir.join("venv").join("bin").join("pip")
	};
	run(plugin_dir, pip.to_string_lossy().as_ref(), &["install", "-r", "requirements.txt"])
}

fn run(dir: &Path, command: &str, args: &[&str]) -> Result<()> {
	log::debug!("running '{command} {}' in {}", args.join(" "), dir.display());

	let status = Command::new(command)
		.args(args)
		.current_dir(dir)
		.status()
		.map_err(|e| PluginStoreError::filesystem(dir, e))?;

	if !status.success() {
		return Err(PluginStoreError::filesystem(
			dir,
			std::io::Error::other(format!("'{command}' exited with {status}")),
		));
	}

	Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use std::path::PathBuf;
	use std::sync::Mutex;

	/// Records bootstrap calls instead of running a real package manager,
	/// so the dispatch from a parsed manifest down to the dependency
	/// installer can be verified without a real `npm`/`python3` on hand.
	#[derive(Default)]
	pub struct FakeDependencyInstaller {
		pub calls: Mutex<Vec<(Runtime, PathBuf)>>,
	}

	impl FakeDependencyInstaller {
		pub fn new() -> Self {
			Self::default()
		}
	}

	impl DependencyInstaller for FakeDependencyInstaller {
		fn install(&self, runtime: &Runtime, plugin_dir: &Path) -> Result<()> {
			self.calls.lock().unwrap().push((runtime.clone(), plugin_dir.to_owned()));
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::test_support::FakeDependencyInstaller;
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn other_runtime_is_a_no_op() {
		let tmp = TempDir::new().unwrap();
		assert!(CommandDependencyInstaller.install(&Runtime::Other("dotnet".to_owned()), tmp.path()).is_ok());
	}

	#[test]
	fn fake_installer_records_nodejs_bootstrap_call() {
		let tmp = TempDir::new().unwrap();
		let installer = FakeDependencyInstaller::new();

		installer.install(&Runtime::Nodejs, tmp.path()).unwrap();

		let calls = installer.calls.lock().unwrap();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0], (Runtime::Nodejs, tmp.path().to_owned()));
	}

	#[test]
	fn fake_installer_records_python_bootstrap_call() {
		let tmp = TempDir::new().unwrap();
		let installer = FakeDependencyInstaller::new();

		installer.install(&Runtime::Python, tmp.path()).unwrap();

		let calls = installer.calls.lock().unwrap();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0], (Runtime::Python, tmp.path().to_owned()));
	}
}
