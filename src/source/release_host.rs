// SPDX-License-Identifier: Apache-2.0

//! A generic release-hosting source (organization + repository + kind),
//! downloading either directly by predictable URL or, when a bearer token
//! is configured, via the release-metadata API so private assets resolve.

use semver::Version;
use serde::Deserialize;

use super::asset_file_name;
use super::platform::{Arch, Os};
use super::DownloadStream;
use crate::error::{PluginStoreError, Result};
use crate::http::HttpClient;
use crate::identity::{parse_tolerant_version, PluginKind};

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
	name: String,
	url: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseMetadata {
	tag_name: String,
	#[serde(default)]
	assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone)]
pub struct ReleaseHostSource {
	org: String,
	repo: String,
	kind: PluginKind,
	token: Option<String>,
}

impl ReleaseHostSource {
	pub fn new(org: impl Into<String>, repo: impl Into<String>, kind: PluginKind) -> Self {
		ReleaseHostSource {
			org: org.into(),
			repo: repo.into(),
			kind,
			token: crate::env::github_token(),
		}
	}

	fn download_base(&self, version: &Version) -> String {
		format!("https://github.com/{}/{}/releases/download/v{}", self.org, self.repo, version)
	}

	fn metadata_url(&self, tag: &str) -> String {
		format!("https://api.github.com/repos/{}/{}/releases/tags/{}", self.org, self.repo, tag)
	}

	fn latest_url(&self) -> String {
		format!("https://api.github.com/repos/{}/{}/releases/latest", self.org, self.repo)
	}

	pub fn download(&self, client: &dyn HttpClient, kind: PluginKind, name: &str, version: &Version, os: Os, arch: Arch) -> Result<DownloadStream> {
		log::debug!("downloading {} {name} v{version} from {}/{}", self.kind, self.org, self.repo);
		let asset_name = asset_file_name(kind, name, version, os, arch);

		match &self.token {
			None => {
				let url = format!("{}/{asset_name}", self.download_base(version));
				fetch_ok(client, &url, None)
			}
			Some(token) => {
				let tag = format!("v{version}");
				let metadata = self.fetch_metadata(client, &self.metadata_url(&tag))?;
				let asset = metadata
					.assets
					.iter()
					.find(|a| a.name == asset_name)
					.ok_or_else(|| PluginStoreError::AssetNotFound {
						tag: metadata.tag_name.clone(),
						asset_name: asset_name.clone(),
					})?;
				fetch_ok(client, &asset.url, Some(token))
			}
		}
	}

	pub fn latest_version(&self, client: &dyn HttpClient, _kind: PluginKind, _name: &str) -> Result<Version> {
		let metadata = self.fetch_metadata(client, &self.latest_url())?;
		parse_tolerant_version(&metadata.tag_name)
	}

	fn fetch_metadata(&self, client: &dyn HttpClient, url: &str) -> Result<ReleaseMetadata> {
		let response = client.get(url, self.token.as_deref())?;
		if response.status == 404 && self.token.is_none() {
			return Err(PluginStoreError::SourceUnavailable {
				url: url.to_owned(),
				detail: "not found (set GITHUB_TOKEN if this is a private repository)".to_owned(),
			});
		}
		if response.status < 200 || response.status >= 300 {
			return Err(PluginStoreError::SourceUnavailable {
				url: url.to_owned(),
				detail: format!("unexpected status {}", response.status),
			});
		}
		Ok(serde_json::from_reader(response.body)?)
	}
}

fn fetch_ok(client: &dyn HttpClient, url: &str, token: Option<&str>) -> Result<DownloadStream> {
	let response = client.get(url, token)?;
	if response.status < 200 || response.status >= 300 {
		return Err(PluginStoreError::SourceUnavailable {
			url: url.to_owned(),
			detail: format!("unexpected status {}", response.status),
		});
	}
	Ok(response.body)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::http::test_support::FakeHttpClient;
	use std::io::Read;

	#[test]
	fn downloads_directly_when_no_token_configured() {
		let source = ReleaseHostSource {
			org: "pulumi".to_owned(),
			repo: "pulumi-resource-aws".to_owned(),
			kind: PluginKind::Resource,
			token: None,
		};
		let version = Version::parse("1.2.3").unwrap();
		let url = format!(
			"https://github.com/pulumi/pulumi-resource-aws/releases/download/v1.2.3/{}",
			asset_file_name(PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664)
		);
		let client = FakeHttpClient::new().with_response(url, 200, b"bytes".to_vec());

		let mut stream = source.download(&client, PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664).unwrap();
		let mut body = Vec::new();
		stream.read_to_end(&mut body).unwrap();
		assert_eq!(body, b"bytes");
	}

	#[test]
	fn uses_metadata_api_and_asset_url_when_token_present() {
		let source = ReleaseHostSource {
			org: "pulumi".to_owned(),
			repo: "pulumi-resource-aws".to_owned(),
			kind: PluginKind::Resource,
			token: Some("secret".to_owned()),
		};
		let version = Version::parse("1.2.3").unwrap();
		let asset_name = asset_file_name(PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664);
		let metadata_url = source.metadata_url("v1.2.3");
		let metadata_json = format!(r#"{{"tag_name":"v1.2.3","assets":[{{"name":"{asset_name}","url":"https://api.github.com/asset/42"}}]}}"#);

		let client = FakeHttpClient::new()
			.with_response(metadata_url, 200, metadata_json.into_bytes())
			.with_response("https://api.github.com/asset/42", 200, b"bytes".to_vec());

		let mut stream = source.download(&client, PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664).unwrap();
		let mut body = Vec::new();
		stream.read_to_end(&mut body).unwrap();
		assert_eq!(body, b"bytes");
	}

	#[test]
	fn missing_asset_is_an_error() {
		let source = ReleaseHostSource {
			org: "pulumi".to_owned(),
			repo: "pulumi-resource-aws".to_owned(),
			kind: PluginKind::Resource,
			token: Some("secret".to_owned()),
		};
		let version = Version::parse("1.2.3").unwrap();
		let metadata_url = source.metadata_url("v1.2.3");
		let client = FakeHttpClient::new().with_response(metadata_url, 200, br#"{"tag_name":"v1.2.3","assets":[]}"#.to_vec());

		let err = source.download(&client, PluginKind::Resource, "aws", &version, Os::Linux, Arch::X8664).unwrap_err();
		assert!(matches!(err, PluginStoreError::AssetNotFound { .. }));
	}

	#[test]
	fn latest_version_parses_tag_name() {
		let source = ReleaseHostSource {
			org: "pulumi".to_owned(),
			repo: "pulumi-resource-aws".to_owned(),
			kind: PluginKind::Resource,
			token: None,
		};
		let client = FakeHttpClient::new().with_response(source.latest_url(), 200, br#"{"tag_name":"v2.0.0","assets":[]}"#.to_vec());
		let version = source.latest_version(&client, PluginKind::Resource, "aws").unwrap();
		assert_eq!(version, Version::parse("2.0.0").unwrap());
	}
}
