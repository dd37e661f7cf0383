//! addonrepo - build and publish Kodi addon repositories.
//!
//! Given a directory whose subdirectories are addons, this crate produces
//! everything a Kodi repository serves: the `addons.xml` catalog, its
//! `addons.xml.md5` checksum, one versioned zip per addon, and the icon and
//! fanart each addon declares.
//!
//! # Modules
//!
//! - [`addon`]: addon discovery, manifest parsing and naming
//! - [`config`]: [`RepoConfig`](config::RepoConfig) and the INI config file
//! - [`publisher`]: catalog, checksum, archives, assets and the run pipeline
//! - [`texture`]: the external texture packer
//! - [`vcs`]: source control (pull, commit, push)
//! - [`logging`]: tracing subscriber setup

pub mod addon;
pub mod config;
pub mod logging;
pub mod publisher;
pub mod texture;
pub mod vcs;

mod tool;
