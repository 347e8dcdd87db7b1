// SPDX-License-Identifier: Apache-2.0

//! Like [`UrlSource`](super::url_source::UrlSource) but with a base URL
//! fixed to the vendor's own mirror rather than caller-supplied — the last
//! resort in the fallback chain.

use semver::Version;

use super::platform::{Arch, Os};
use super::url_source::UrlSource;
use super::DownloadStream;
use crate::error::Result;
use crate::http::HttpClient;
use crate::identity::PluginKind;

const VENDOR_MIRROR_BASE: &str = "https://get.pulumi.com/releases/plugins";

#[derive(Debug, Clone)]
pub struct VendorMirrorSource {
	inner: UrlSource,
}

impl VendorMirrorSource {
	pub fn new() -> Self {
		VendorMirrorSource { inner: UrlSource::new(VENDOR_MIRROR_BASE) }
	}

	pub fn download(&self, client: &dyn HttpClient, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> Result<DownloadStream> {
		self.inner.download(client, kind, name, version, os, arch)
	}

	pub fn latest_version(&self) -> Result<Version> {
		self.inner.latest_version()
	}
}

impl Default for VendorMirrorSource {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn latest_version_is_unsupported() {
		assert!(VendorMirrorSource::new().latest_version().is_err());
	}
}
