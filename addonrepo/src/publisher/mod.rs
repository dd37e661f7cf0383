//! Repository publishing.
//!
//! Turns a directory of addon sources into a Kodi addon repository.
//!
//! # Overview
//!
//! The publish workflow:
//! 1. Discover addons under the source root ([`crate::addon::discover`])
//! 2. Concatenate every manifest into the catalog (`addons.xml`)
//! 3. Write the catalog's MD5 next to it (`addons.xml.md5`)
//! 4. Optionally pack media folders with the texture packer
//! 5. Zip each addon into `<name>/<name>-<version>.zip`
//! 6. Copy each addon's icon and fanart next to its archive
//!
//! [`Publisher`] runs these phases and returns a [`PublishReport`]. A broken
//! addon is excluded and logged; it never stops the others.
//!
//! # Example
//!
//! ```ignore
//! use addonrepo::config::RepoConfig;
//! use addonrepo::publisher::{Publisher, RunOptions};
//!
//! let publisher = Publisher::from_config(RepoConfig::new("/path/to/repo"));
//! let report = publisher.run(&RunOptions::default())?;
//!
//! println!("Built {} archives", report.archives.len());
//! ```

mod archive;
mod assets;
mod catalog;
mod checksum;
mod error;
mod report;
mod run;

pub use archive::{build_archive, ArchiveBuildResult, PackageRules};
pub use assets::{copy_asset, copy_assets, AssetCopyResult, CopiedAsset};
pub use catalog::{
    build_catalog, strip_manifest, Catalog, CatalogBuilder, CATALOG_FOOTER, CATALOG_HEADER,
};
pub use checksum::{calculate_md5, md5_hex, verify_checksum, write_checksum};
pub use error::{PublishError, PublishResult};
pub use report::{AddonIssue, CatalogSummary, PublishReport, TextureOutcome};
pub use run::{Publisher, RunOptions};
