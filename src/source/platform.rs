// SPDX-License-Identifier: Apache-2.0

//! OS/architecture detection and the `${VERSION}`/`${OS}`/`${ARCH}` URL
//! placeholder substitution every download source performs before issuing
//! a request.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use semver::Version;

use crate::error::{PluginStoreError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Os {
	Linux,
	MacOs,
	Windows,
}

impl FromStr for Os {
	type Err = ();

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"linux" => Ok(Os::Linux),
			"darwin" => Ok(Os::MacOs),
			"windows" => Ok(Os::Windows),
			_ => Err(()),
		}
	}
}

impl Display for Os {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Os::Linux => "linux",
			Os::MacOs => "darwin",
			Os::Windows => "windows",
		};
		write!(f, "{s}")
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arch {
	X8664,
	Aarch64,
}

impl FromStr for Arch {
	type Err = ();

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"amd64" | "x86_64" => Ok(Arch::X8664),
			"arm64" | "aarch64" => Ok(Arch::Aarch64),
			_ => Err(()),
		}
	}
}

impl Display for Arch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Arch::X8664 => "amd64",
			Arch::Aarch64 => "arm64",
		};
		write!(f, "{s}")
	}
}

const DETECTED_OS: Option<Os> = {
	if cfg!(target_os = "linux") {
		Some(Os::Linux)
	} else if cfg!(target_os = "macos") {
		Some(Os::MacOs)
	} else if cfg!(target_os = "windows") {
		Some(Os::Windows)
	} else {
		None
	}
};

const DETECTED_ARCH: Option<Arch> = {
	if cfg!(target_arch = "x86_64") {
		Some(Arch::X8664)
	} else if cfg!(target_arch = "aarch64") {
		Some(Arch::Aarch64)
	} else {
		None
	}
};

static USER_PROVIDED_PLATFORM: OnceLock<(Os, Arch)> = OnceLock::new();

/// Lets a caller pin the platform the source chain targets, overriding
/// whatever this process was actually compiled for. Idempotent: a second
/// call with a different value is a no-op (the first call wins), mirroring
/// "pin once at startup" usage.
pub fn set_current_platform(os: Os, arch: Arch) {
	let _ = USER_PROVIDED_PLATFORM.get_or_init(|| (os, arch));
}

/// The platform the source chain should request archives for: whatever was
/// pinned via [`set_current_platform`], falling back to what this binary
/// was actually compiled for.
pub fn current_platform() -> Result<(Os, Arch)> {
	if let Some(pinned) = USER_PROVIDED_PLATFORM.get() {
		return Ok(*pinned);
	}
	match (DETECTED_OS, DETECTED_ARCH) {
		(Some(os), Some(arch)) => Ok((os, arch)),
		_ => Err(PluginStoreError::UnsupportedPlatform {
			os: std::env::consts::OS.to_owned(),
			arch: std::env::consts::ARCH.to_owned(),
		}),
	}
}

/// Parses raw `os`/`arch` strings (as they arrive from an embedding CLI's
/// flags or the scanned plugin's own metadata) into the typed, supported
/// pair, or fails with a dedicated [`PluginStoreError::UnsupportedPlatform`]
/// before any network I/O is attempted. The only supported values are
/// `{darwin, linux, windows}` × `{amd64, arm64}`; everything else —
/// including recognized-but-unpublished combinations like `(windows,
/// arm64)` — is accepted here and left to fail later as a normal download
/// error, since this crate has no way to know which artifacts a given
/// release actually published.
pub fn parse_supported_platform(os: &str, arch: &str) -> Result<(Os, Arch)> {
	match (os.parse::<Os>(), arch.parse::<Arch>()) {
		(Ok(os), Ok(arch)) => Ok((os, arch)),
		_ => Err(PluginStoreError::UnsupportedPlatform {
			os: os.to_owned(),
			arch: arch.to_owned(),
		}),
	}
}

/// Substitutes `${VERSION}`, `${OS}`, and `${ARCH}` in a URL template with
/// percent-encoded values for the given version and platform.
pub fn substitute_placeholders(template: &str, version: &Version, os: Os, arch: Arch) -> String {
	let version_str = version.to_string();
	template
		.replace("${VERSION}", &encode(&version_str))
		.replace("${OS}", &encode(&os.to_string()))
		.replace("${ARCH}", &encode(&arch.to_string()))
}

fn encode(value: &str) -> String {
	utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn substitutes_all_three_placeholders() {
		let version = Version::parse("1.2.3").unwrap();
		let url = substitute_placeholders(
			"https://example.com/releases/v${VERSION}/plugin-${OS}-${ARCH}.tar.gz",
			&version,
			Os::Linux,
			Arch::X8664,
		);
		assert_eq!(url, "https://example.com/releases/v1.2.3/plugin-linux-amd64.tar.gz");
	}

	#[test]
	fn parse_supported_platform_rejects_unknown_os_or_arch() {
		assert!(parse_supported_platform("linux", "amd64").is_ok());
		assert!(matches!(
			parse_supported_platform("plan9", "amd64"),
			Err(PluginStoreError::UnsupportedPlatform { .. })
		));
		assert!(matches!(
			parse_supported_platform("linux", "riscv64"),
			Err(PluginStoreError::UnsupportedPlatform { .. })
		));
	}

	#[test]
	fn os_and_arch_round_trip_through_display_and_from_str() {
		assert_eq!("linux".parse::<Os>().unwrap(), Os::Linux);
		assert_eq!("darwin".parse::<Os>().unwrap(), Os::MacOs);
		assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X8664);
		assert_eq!("x86_64".parse::<Arch>().unwrap(), Arch::X8664);
	}
}
