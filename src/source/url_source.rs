// SPDX-License-Identifier: Apache-2.0

//! A single-endpoint-template download source: `plugin_download_url` and
//! override-table entries both resolve to this.

use semver::Version;

use super::asset_file_name;
use super::platform::{substitute_placeholders, Arch, Os};
use super::DownloadStream;
use crate::error::{PluginStoreError, Result};
use crate::http::HttpClient;
use crate::identity::PluginKind;

#[derive(Debug, Clone)]
pub struct UrlSource {
	base: String,
}

impl UrlSource {
	pub fn new(base: impl Into<String>) -> Self {
		UrlSource { base: base.into() }
	}

	pub fn download(&self, client: &dyn HttpClient, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> Result<DownloadStream> {
		let endpoint = self.endpoint(kind, name, version, os, arch);
		let response = client.get(&endpoint, None)?;
		if response.status < 200 || response.status >= 300 {
			return Err(PluginStoreError::SourceUnavailable {
				url: endpoint,
				detail: format!("unexpected status {}", response.status),
			});
		}
		Ok(response.body)
	}

	pub fn latest_version(&self) -> Result<Version> {
		Err(PluginStoreError::LatestNotSupported)
	}

	fn endpoint(&self, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> String {
		let substituted = substitute_placeholders(&self.base, version, os, arch);
		let base = substituted.strip_suffix('/').unwrap_or(&substituted);
		format!("{base}/{}", asset_file_name(kind, name, version, os, arch))
	}
}
