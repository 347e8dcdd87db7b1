// SPDX-License-Identifier: Apache-2.0

//! A local, on-disk cache of versioned, named executable plugins.
//!
//! This crate resolves which plugin satisfies a caller's request (by
//! [`PluginKind`], name, and optional version), locates a matching binary
//! on the machine, and — when one is missing — downloads the correct
//! archive from one of several remote [`Source`]s and installs it into the
//! cache under crash-safe, inter-process-locked discipline.
//!
//! It does not sandbox plugins, verify archive signatures, coordinate
//! across machines, or discover plugins outside the cache directory and
//! the process search path; those are left to the embedding tool.

pub mod cache;
pub mod env;
pub mod error;
pub mod extract;
pub mod http;
pub mod identity;
pub mod installer;
pub mod lock;
pub mod manifest;
pub mod overrides;
pub mod resolver;
pub mod runtime_bootstrap;
pub mod selector;
pub mod source;

pub use error::{PluginStoreError, Result};
pub use identity::{PluginInfo, PluginKind};
pub use overrides::OverrideTable;
pub use resolver::ResolvedPlugin;
pub use source::Source;
