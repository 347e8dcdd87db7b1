// SPDX-License-Identifier: Apache-2.0

//! Unpacks a downloaded plugin archive into its final directory.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{PluginStoreError, Result};

/// The extraction seam the installer unpacks through. The real
/// implementation is [`GzTarExtractor`]; tests substitute a fake that just
/// writes marker files, so installer state-machine tests don't need real
/// archives on disk.
pub trait Extractor: Send + Sync {
	/// Unpacks a gzip-compressed tar stream directly into `dest_dir`.
	/// `dest_dir` must already exist; its contents become the plugin's
	/// final installed layout. Takes a reader rather than a path so a
	/// download's HTTP body can be piped straight through without ever
	/// being staged on disk or fully buffered in memory first.
	fn extract(&self, reader: &mut dyn Read, dest_dir: &Path) -> Result<()>;
}

/// Gzip-compressed tar archives, the format every plugin is published in.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzTarExtractor;

impl Extractor for GzTarExtractor {
	fn extract(&self, reader: &mut dyn Read, dest_dir: &Path) -> Result<()> {
		let decoder = GzDecoder::new(reader);
		let mut archive = Archive::new(decoder);
		archive.unpack(dest_dir).map_err(|e| PluginStoreError::filesystem(dest_dir, e))
	}
}


#[cfg(test)]
mod tests {
	use super::test_support::FakeExtractor;
	use super::*;
	use std::io::Cursor;
	use tempfile::TempDir;

	#[test]
	fn fake_extractor_writes_marker_and_records_call() {
		let tmp = TempDir::new().unwrap();
		let dest = tmp.path().join("dest");
		std::fs::create_dir_all(&dest).unwrap();

		let extractor = FakeExtractor::new();
		let mut reader = Cursor::new(b"not-really-an-archive".to_vec());
		extractor.extract(&mut reader, &dest).unwrap();

		assert!(dest.join("extracted.marker").exists());
		assert_eq!(extractor.calls.lock().unwrap().len(), 1);
	}

	#[test]
	fn fake_extractor_writes_registered_extra_files() {
		let tmp = TempDir::new().unwrap();
		let dest = tmp.path().join("dest");
		std::fs::create_dir_all(&dest).unwrap();

		let extractor = FakeExtractor::new().with_extra_file("PulumiPlugin.yaml", "runtime:\n  name: nodejs\n");
		let mut reader = Cursor::new(Vec::new());
		extractor.extract(&mut reader, &dest).unwrap();

		assert_eq!(std::fs::read_to_string(dest.join("PulumiPlugin.yaml")).unwrap(), "runtime:\n  name: nodejs\n");
	}
}
