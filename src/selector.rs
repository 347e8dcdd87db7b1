// SPDX-License-Identifier: Apache-2.0

//! Picks the single best installed plugin for a requested semver range.

use semver::{Version, VersionReq};

use crate::error::{PluginStoreError, Result};
use crate::identity::{PluginInfo, PluginKind};

/// Filters `candidates` to `kind`+`name`, then returns the highest-version
/// entry whose version satisfies `range` — or, if nothing satisfies it, the
/// lone unversioned entry when one exists ("something is better than
/// nothing"). Ties among nil-versioned candidates are broken arbitrarily;
/// ties among equal concrete versions are broken by comparing the original
/// version string lexicographically.
pub fn select<'a>(
	candidates: &'a [PluginInfo],
	kind: PluginKind,
	name: &str,
	range: &VersionReq,
) -> Result<&'a PluginInfo> {
	let mut matching: Vec<&PluginInfo> = candidates.iter().filter(|p| p.kind == kind && p.name == name).collect();

	matching.sort_by(|a, b| match (&a.version, &b.version) {
		(None, None) => std::cmp::Ordering::Equal,
		(None, Some(_)) => std::cmp::Ordering::Less,
		(Some(_), None) => std::cmp::Ordering::Greater,
		(Some(va), Some(vb)) => va.cmp(vb).then_with(|| va.to_string().cmp(&vb.to_string())),
	});

	let mut accepted: Option<&PluginInfo> = None;

	for candidate in matching {
		match &candidate.version {
			None => {
				if accepted.is_none() {
					accepted = Some(candidate);
				}
			}
			Some(v) => {
				if range.matches(v) {
					accepted = Some(candidate);
				}
			}
		}
	}

	accepted.ok_or_else(|| PluginStoreError::SelectorMismatch {
		kind,
		name: name.to_owned(),
		range: range.to_string(),
	})
}

/// The legacy (non-range-based) selection rule: newest version `>=`
/// `requested`, or the newest overall when `requested` is `None`.
pub fn select_legacy<'a>(
	candidates: &'a [PluginInfo],
	kind: PluginKind,
	name: &str,
	requested: Option<&Version>,
) -> Result<&'a PluginInfo> {
	let mut matching: Vec<&PluginInfo> = candidates
		.iter()
		.filter(|p| p.kind == kind && p.name == name)
		.collect();

	matching.sort_by(|a, b| a.version.cmp(&b.version));

	let best = match requested {
		None => matching.last().copied(),
		Some(req) => matching.into_iter().filter(|p| p.version.as_ref().is_some_and(|v| v >= req)).last(),
	};

	best.ok_or_else(|| PluginStoreError::SelectorMismatch {
		kind,
		name: name.to_owned(),
		range: requested.map(|v| format!(">={v}")).unwrap_or_else(|| "*".to_owned()),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn plugin(kind: PluginKind, name: &str, version: Option<&str>) -> PluginInfo {
		PluginInfo::new(kind, name, version.map(|v| Version::parse(v).unwrap()))
	}

	#[test]
	fn selects_highest_version_satisfying_range() {
		let plugins = vec![
			plugin(PluginKind::Resource, "aws", Some("1.0.0")),
			plugin(PluginKind::Resource, "aws", Some("1.4.0")),
			plugin(PluginKind::Resource, "aws", Some("2.0.0-beta")),
			plugin(PluginKind::Resource, "aws", Some("2.1.0")),
		];
		let range = VersionReq::parse(">=1.2.0,<2.0.0").unwrap();

		let selected = select(&plugins, PluginKind::Resource, "aws", &range).unwrap();
		assert_eq!(selected.version.as_ref().unwrap().to_string(), "1.4.0");
	}

	#[test]
	fn falls_back_to_lone_unversioned_entry() {
		let plugins = vec![plugin(PluginKind::Language, "nodejs", None)];
		let range = VersionReq::parse("*").unwrap();

		let selected = select(&plugins, PluginKind::Language, "nodejs", &range).unwrap();
		assert!(selected.version.is_none());
	}

	#[test]
	fn prefers_versioned_match_over_unversioned_fallback() {
		let plugins = vec![
			plugin(PluginKind::Language, "nodejs", None),
			plugin(PluginKind::Language, "nodejs", Some("1.0.0")),
		];
		let range = VersionReq::parse("*").unwrap();

		let selected = select(&plugins, PluginKind::Language, "nodejs", &range).unwrap();
		assert_eq!(selected.version.as_ref().unwrap().to_string(), "1.0.0");
	}

	#[test]
	fn no_match_is_an_error() {
		let plugins = vec![plugin(PluginKind::Resource, "aws", Some("1.0.0"))];
		let range = VersionReq::parse(">=2.0.0").unwrap();
		assert!(select(&plugins, PluginKind::Resource, "aws", &range).is_err());
	}

	#[test]
	fn legacy_mode_picks_newest_overall_without_requested_version() {
		let plugins = vec![
			plugin(PluginKind::Resource, "aws", Some("1.0.0")),
			plugin(PluginKind::Resource, "aws", Some("2.0.0")),
		];
		let selected = select_legacy(&plugins, PluginKind::Resource, "aws", None).unwrap();
		assert_eq!(selected.version.as_ref().unwrap().to_string(), "2.0.0");
	}

	#[test]
	fn legacy_mode_picks_newest_gte_requested() {
		let plugins = vec![
			plugin(PluginKind::Resource, "aws", Some("1.0.0")),
			plugin(PluginKind::Resource, "aws", Some("1.5.0")),
			plugin(PluginKind::Resource, "aws", Some("2.0.0")),
		];
		let requested = Version::parse("1.2.0").unwrap();
		let selected = select_legacy(&plugins, PluginKind::Resource, "aws", Some(&requested)).unwrap();
		assert_eq!(selected.version.as_ref().unwrap().to_string(), "2.0.0");
	}
}
