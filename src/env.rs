// SPDX-License-Identifier: Apache-2.0

//! Every environment variable this crate recognizes, funneled through one
//! module so the set of names stays the single source of truth and so tests
//! can exercise the logic without racing real process environment state.

use std::env;

pub const LEGACY_PLUGIN_SEARCH: &str = "PULUMI_ENABLE_LEGACY_PLUGIN_SEARCH";
pub const IGNORE_AMBIENT_PLUGINS: &str = "PULUMI_IGNORE_AMBIENT_PLUGINS";
pub const EXPERIMENTAL: &str = "PULUMI_EXPERIMENTAL";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_REPOSITORY_OWNER: &str = "GITHUB_REPOSITORY_OWNER";
pub const GITHUB_PERSONAL_ACCESS_TOKEN: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

fn is_set(name: &str) -> bool {
	env::var_os(name).is_some_and(|v| !v.is_empty())
}

fn is_truthy(name: &str) -> bool {
	match env::var(name) {
		Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
		Err(_) => false,
	}
}

pub fn legacy_plugin_search_enabled() -> bool {
	is_set(LEGACY_PLUGIN_SEARCH)
}

pub fn ambient_plugins_ignored() -> bool {
	is_truthy(IGNORE_AMBIENT_PLUGINS)
}

pub fn experimental_enabled() -> bool {
	is_set(EXPERIMENTAL)
}

pub fn github_token() -> Option<String> {
	warn_if_deprecated_pat_present();
	env::var(GITHUB_TOKEN).ok().filter(|v| !v.is_empty())
}

pub fn github_repository_owner() -> Option<String> {
	env::var(GITHUB_REPOSITORY_OWNER).ok().filter(|v| !v.is_empty())
}

/// Logs a warning if the deprecated PAT variable is present; it otherwise has
/// no effect on behavior.
pub fn warn_if_deprecated_pat_present() {
	if is_set(GITHUB_PERSONAL_ACCESS_TOKEN) {
		log::warn!(
			"{} is deprecated and no longer used; set {} instead",
			GITHUB_PERSONAL_ACCESS_TOKEN,
			GITHUB_TOKEN
		);
	}
}
