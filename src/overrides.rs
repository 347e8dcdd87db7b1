// SPDX-License-Identifier: Apache-2.0

//! Parses the comma-separated `pattern=URL` override list that lets a caller
//! redirect specific plugin downloads without touching the default source
//! chain.

use regex::Regex;

use crate::error::{PluginStoreError, Result};

/// A single `pattern=URL` entry. `pattern` is a compiled regular
/// expression matched against the plugin name; `url` is used verbatim.
#[derive(Debug, Clone)]
pub struct Override {
	pub pattern: Regex,
	pub url: String,
}

/// An ordered, immutable table of overrides. Lookup returns the first
/// matching entry, so earlier entries in the source string take priority.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
	entries: Vec<Override>,
}

impl OverrideTable {
	pub fn empty() -> Self {
		OverrideTable { entries: Vec::new() }
	}

	/// Parses a comma-separated list of `pattern=URL` pairs. An entry
	/// missing its `=` separator, with an empty pattern or URL, or with a
	/// pattern that doesn't compile as a regular expression, is rejected —
	/// the whole list fails together rather than silently dropping one bad
	/// entry.
	pub fn parse(raw: &str) -> Result<Self> {
		let mut entries = Vec::new();

		for part in raw.split(',') {
			let part = part.trim();
			if part.is_empty() {
				continue;
			}

			let mut segments = part.splitn(3, '=');
			let (Some(pattern), Some(url), None) = (segments.next(), segments.next(), segments.next()) else {
				return Err(PluginStoreError::InvalidOverride {
					entry: part.to_owned(),
					reason: "expected exactly one 'pattern=URL' pair".to_owned(),
				});
			};

			let pattern = pattern.trim();
			let url = url.trim();

			if pattern.is_empty() {
				return Err(PluginStoreError::InvalidOverride {
					entry: part.to_owned(),
					reason: "pattern is empty".to_owned(),
				});
			}
			if url.is_empty() {
				return Err(PluginStoreError::InvalidOverride {
					entry: part.to_owned(),
					reason: "URL is empty".to_owned(),
				});
			}

			let compiled = Regex::new(pattern).map_err(|e| PluginStoreError::InvalidOverride {
				entry: part.to_owned(),
				reason: format!("invalid pattern: {e}"),
			})?;

			entries.push(Override {
				pattern: compiled,
				url: url.to_owned(),
			});
		}

		Ok(OverrideTable { entries })
	}

	/// First entry whose pattern matches `name`, in source order.
	pub fn lookup(&self, name: &str) -> Option<&str> {
		self.entries.iter().find(|o| o.pattern.is_match(name)).map(|o| o.url.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
