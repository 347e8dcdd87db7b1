// SPDX-License-Identifier: Apache-2.0

//! Where a plugin archive comes from. Modeled as a closed tagged variant
//! over the four concrete source kinds, rather than a `dyn Trait`
//! hierarchy — the fallback composite owns the other kinds by value, and
//! nothing here needs open-ended polymorphism.

pub mod fallback;
pub mod platform;
pub mod release_host;
pub mod url_source;
pub mod vendor_mirror;

use std::io::Read;

use semver::Version;

use crate::error::Result;
use crate::http::HttpClient;
use crate::identity::PluginKind;
use crate::overrides::OverrideTable;

pub use fallback::FallbackSource;
pub use platform::{parse_supported_platform, Arch, Os};
pub use release_host::ReleaseHostSource;
pub use url_source::UrlSource;
pub use vendor_mirror::VendorMirrorSource;

/// The vendor's own account, used as the public-release default organization.
pub const CANONICAL_VENDOR_ORG: &str = "pulumi";

/// A download's body, handed back as a lazy reader rather than a buffer so
/// callers can pipe it straight into the extractor without ever holding the
/// whole archive in memory.
pub type DownloadStream = Box<dyn Read + Send>;

/// `pulumi-<kind>-<name>-v<version>-<os>-<arch>.tar.gz`
pub fn asset_file_name(kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> String {
	format!("pulumi-{kind}-{name}-v{version}-{os}-{arch}.tar.gz")
}

pub enum Source {
	Url(UrlSource),
	ReleaseHost(ReleaseHostSource),
	VendorMirror(VendorMirrorSource),
	Fallback(FallbackSource),
}

impl Source {
	pub fn download(&self, client: &dyn HttpClient, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> Result<DownloadStream> {
		match self {
			Source::Url(s) => s.download(client, kind, name, version, os, arch),
			Source::ReleaseHost(s) => s.download(client, kind, name, version, os, arch),
			Source::VendorMirror(s) => s.download(client, kind, name, version, os, arch),
			Source::Fallback(s) => s.download(client, kind, name, version, os, arch),
		}
	}

	pub fn latest_version(&self, client: &dyn HttpClient, kind: PluginKind, name: &str) -> Result<Version> {
		match self {
			Source::Url(s) => s.latest_version(),
			Source::ReleaseHost(s) => s.latest_version(client, kind, name),
			Source::VendorMirror(s) => s.latest_version(),
			Source::Fallback(s) => s.latest_version(client, kind, name),
		}
	}
}

/// Picks the source for `plugin_download_url` / override-table / fallback,
/// per the precedence order: explicit per-plugin URL, then a matching
/// override pattern, then the default fallback chain.
pub fn select_source(plugin_download_url: Option<&str>, overrides: &OverrideTable, name: &str, repo: &str, kind: PluginKind) -> Source {
	if let Some(url) = plugin_download_url {
		return Source::Url(UrlSource::new(url));
	}
	if let Some(url) = overrides.lookup(name) {
		return Source::Url(UrlSource::new(url));
	}
	Source::Fallback(FallbackSource::new(repo, kind))
}
