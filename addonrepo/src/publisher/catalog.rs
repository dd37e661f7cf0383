//! Catalog (`addons.xml`) generation.
//!
//! The catalog is every addon manifest concatenated, minus their XML
//! declarations, wrapped in a single `<addons>` element. Manifests are copied
//! as text, not re-serialised, so comments and formatting survive.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::{PublishError, PublishResult};
use crate::addon::AddonDescriptor;
use crate::config::RepoConfig;

/// Catalog prologue.
pub const CATALOG_HEADER: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n";

/// Catalog epilogue.
pub const CATALOG_FOOTER: &str = "\n</addons>\n";

/// Lines containing this marker are dropped from each manifest.
const DECLARATION_MARKER: &str = "<?xml";

/// Strip a manifest down to its catalog fragment.
///
/// Declaration lines are dropped, each remaining line is right-trimmed, and
/// trailing whitespace is removed from the result.
///
/// # Examples
///
/// ```
/// use addonrepo::publisher::strip_manifest;
///
/// let xml = "<?xml version=\"1.0\"?>\n<addon version=\"1.0\">  \n</addon>\n\n";
/// assert_eq!(strip_manifest(xml), "<addon version=\"1.0\">\n</addon>");
/// ```
pub fn strip_manifest(text: &str) -> String {
    let mut fragment = String::with_capacity(text.len());
    for line in text.lines() {
        if line.contains(DECLARATION_MARKER) {
            continue;
        }
        fragment.push_str(line.trim_end());
        fragment.push('\n');
    }
    fragment.truncate(fragment.trim_end().len());
    fragment
}

/// A built catalog, not yet written.
#[derive(Debug)]
pub struct Catalog {
    /// Full catalog text.
    pub content: String,

    /// Addons whose manifests made it into the catalog, in catalog order.
    pub included: Vec<String>,

    /// Addons left out, with the reason.
    pub excluded: Vec<(String, PublishError)>,
}

impl Catalog {
    /// Write the catalog as UTF-8, creating the parent directory if needed.
    pub fn write(&self, path: &Path) -> PublishResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PublishError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, self.content.as_bytes()).map_err(|e| PublishError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!("Wrote addons list to {}", path.display());
        Ok(())
    }

    /// Number of manifests in the catalog.
    pub fn len(&self) -> usize {
        self.included.len()
    }

    /// Whether the catalog lists no addons.
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Incremental catalog builder.
#[derive(Debug)]
pub struct CatalogBuilder {
    buffer: String,
    included: Vec<String>,
    excluded: Vec<(String, PublishError)>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Start an empty catalog.
    pub fn new() -> Self {
        Self {
            buffer: CATALOG_HEADER.to_string(),
            included: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Append one manifest's raw text.
    pub fn add_manifest_text(&mut self, addon_name: &str, text: &str) {
        self.buffer.push_str(&strip_manifest(text));
        self.buffer.push_str("\n\n");
        self.included.push(addon_name.to_string());
    }

    /// Append an addon's manifest, or record why it was left out.
    pub fn add_addon(&mut self, addon: &AddonDescriptor, config: &RepoConfig) {
        match addon.read_manifest_text(config) {
            Ok(text) => self.add_manifest_text(&addon.name, &text),
            Err(e) => {
                warn!("Excluding {} for {}", addon.name, e);
                self.excluded.push((addon.name.clone(), e));
            }
        }
    }

    /// Close the catalog.
    pub fn finish(mut self) -> Catalog {
        self.buffer.truncate(self.buffer.trim_end().len());
        self.buffer.push_str(CATALOG_FOOTER);

        Catalog {
            content: self.buffer,
            included: self.included,
            excluded: self.excluded,
        }
    }
}

/// Build the catalog for `addons` in the given order.
pub fn build_catalog(addons: &[AddonDescriptor], config: &RepoConfig) -> Catalog {
    let mut builder = CatalogBuilder::new();
    for addon in addons {
        builder.add_addon(addon, config);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn addon_with_manifest(root: &Path, name: &str, manifest: Option<&str>) -> AddonDescriptor {
        let path = root.join(name);
        fs::create_dir_all(&path).unwrap();
        if let Some(text) = manifest {
            fs::write(path.join("addon.xml"), text).unwrap();
        }
        AddonDescriptor::new(name, path)
    }

    #[test]
    fn test_strip_manifest_crlf() {
        let xml = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n",
            "<addon version=\"1.0\">\r\n  <x/>  \r\n</addon>\r\n",
        );
        assert_eq!(strip_manifest(xml), "<addon version=\"1.0\">\n  <x/>\n</addon>");
    }

    #[test]
    fn test_strip_manifest_drops_any_declaration_line() {
        let xml = "<addon>\n<?xml-stylesheet href=\"a\"?>\n</addon>";
        assert_eq!(strip_manifest(xml), "<addon>\n</addon>");
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = CatalogBuilder::new().finish();
        assert_eq!(
            catalog.content,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n</addons>\n"
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_exact_layout_two_addons() {
        let mut builder = CatalogBuilder::new();
        builder.add_manifest_text("a", "<?xml version=\"1.0\"?>\n<addon id=\"a\"/>\n");
        builder.add_manifest_text("b", "<addon id=\"b\">\n</addon>\n\n\n");
        let catalog = builder.finish();

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                        <addons>\n\
                        <addon id=\"a\"/>\n\
                        \n\
                        <addon id=\"b\">\n\
                        </addon>\n\
                        </addons>\n";
        assert_eq!(catalog.content, expected);
        assert_eq!(catalog.included, vec!["a", "b"]);
    }

    #[test]
    fn test_build_catalog_excludes_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig::new(temp.path());
        let addons = vec![
            addon_with_manifest(temp.path(), "A", Some("<addon id=\"A\" version=\"1.0\"/>")),
            addon_with_manifest(temp.path(), "B", None),
        ];

        let catalog = build_catalog(&addons, &config);

        assert_eq!(catalog.included, vec!["A"]);
        assert_eq!(catalog.excluded.len(), 1);
        assert_eq!(catalog.excluded[0].0, "B");
        assert!(matches!(
            catalog.excluded[0].1,
            PublishError::ManifestMissing { .. }
        ));
        assert!(catalog.content.contains("<addon id=\"A\" version=\"1.0\"/>"));
    }

    #[test]
    fn test_build_catalog_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig::new(temp.path());
        let addons = vec![
            addon_with_manifest(temp.path(), "one", Some("<addon version=\"1\"/>")),
            addon_with_manifest(temp.path(), "two", Some("<addon version=\"2\"/>")),
        ];

        let first = build_catalog(&addons, &config);
        let second = build_catalog(&addons, &config);
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn test_write_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dist").join("addons.xml");

        let catalog = CatalogBuilder::new().finish();
        catalog.write(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), catalog.content);
    }

    #[test]
    fn test_write_failure_reported() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be overwritten with a file.
        let path = temp.path().join("addons.xml");
        fs::create_dir(&path).unwrap();

        let result = CatalogBuilder::new().finish().write(&path);
        assert!(matches!(result, Err(PublishError::WriteFailed { .. })));
    }
}
