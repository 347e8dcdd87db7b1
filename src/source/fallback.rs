// SPDX-License-Identifier: Apache-2.0

//! The default source chain: public release host, then (if experimental
//! private-fallback is enabled and credentials are available) a private
//! release host under the caller's own organization, then the vendor
//! mirror as a last resort.

use semver::Version;

use super::platform::{Arch, Os};
use super::release_host::ReleaseHostSource;
use super::vendor_mirror::VendorMirrorSource;
use super::{DownloadStream, CANONICAL_VENDOR_ORG};
use crate::env;
use crate::error::{PluginStoreError, Result};
use crate::http::HttpClient;
use crate::identity::PluginKind;

#[derive(Debug, Clone)]
pub struct FallbackSource {
	repo: String,
	kind: PluginKind,
}

impl FallbackSource {
	pub fn new(repo: impl Into<String>, kind: PluginKind) -> Self {
		FallbackSource { repo: repo.into(), kind }
	}

	fn public(&self) -> ReleaseHostSource {
		ReleaseHostSource::new(CANONICAL_VENDOR_ORG, &self.repo, self.kind)
	}

	/// The private fallback is only attempted when experimental mode is on,
	/// an owner is configured, and a token is available to authenticate
	/// with — without all three this returns `None` and callers skip
	/// straight past it.
	fn private(&self) -> Option<ReleaseHostSource> {
		if !env::experimental_enabled() {
			return None;
		}
		let owner = env::github_repository_owner()?;
		env::github_token()?;
		Some(ReleaseHostSource::new(owner, &self.repo, self.kind))
	}

	pub fn download(&self, client: &dyn HttpClient, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> Result<DownloadStream> {
		match self.public().download(client, kind, name, version, os, arch) {
			Ok(stream) => return Ok(stream),
			Err(public_err) => {
				if let Some(private) = self.private() {
					match private.download(client, kind, name, version, os, arch) {
						Ok(stream) => return Ok(stream),
						Err(private_err) => {
							log::debug!("private release-host download failed, falling back to vendor mirror: {private_err}");
							let _ = public_err;
						}
					}
				}
			}
		}

		VendorMirrorSource::new().download(client, kind, name, version, os, arch)
	}

	pub fn latest_version(&self, client: &dyn HttpClient, kind: PluginKind, name: &str) -> Result<Version> {
		match self.public().latest_version(client, kind, name) {
			Ok(v) => Ok(v),
			Err(public_err) => match self.private() {
				Some(private) => private.latest_version(client, kind, name).map_err(|private_err| PluginStoreError::SourceUnavailable {
					url: format!("{CANONICAL_VENDOR_ORG}/{} (public) + private fallback", self.repo),
					detail: format!("public: {public_err}; private: {private_err}"),
				}),
				None => Err(public_err),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::http::test_support::FakeHttpClient;
	use std::env as std_env;
	use std::io::Read;
	use std::sync::Mutex;

	static ENV_GUARD: Mutex<()> = Mutex::new(());

	fn clear_env() {
		std_env::remove_var(env::EXPERIMENTAL);
		std_env::remove_var(env::GITHUB_REPOSITORY_OWNER);
		std_env::remove_var(env::GITHUB_TOKEN);
	}

	#[test]
	fn falls_back_to_vendor_mirror_when_public_release_host_fails_and_no_private_configured() {
		let _guard = ENV_GUARD.lock().unwrap();
		clear_env();

		let source = FallbackSource::new("pulumi-resource-aws", PluginKind::Resource);
		let version = Version::parse("1.2.3").unwrap();
		let mirror_url = format!(
			"https://get.pulumi.com/releases/plugins/{}",
			super::asset_file_name(PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664)
		);
		let client = FakeHttpClient::new().with_response(mirror_url, 200, b"mirror-bytes".to_vec());

		let mut stream = source.download(&client, PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664).unwrap();
		let mut body = Vec::new();
		stream.read_to_end(&mut body).unwrap();
		assert_eq!(body, b"mirror-bytes");

		clear_env();
	}

	#[test]
	fn latest_version_falls_through_to_public_error_without_private_config() {
		let _guard = ENV_GUARD.lock().unwrap();
		clear_env();

		let source = FallbackSource::new("pulumi-resource-aws", PluginKind::Resource);
		let client = FakeHttpClient::new();
		assert!(source.latest_version(&client, PluginKind::Resource, "aws").is_err());

		clear_env();
	}
}
