//! Addon manifest (`addon.xml`) reader.
//!
//! Only a handful of values are needed: the root element's `version`, `id`
//! and `name` attributes, and the icon/fanart paths declared under
//! `extension/assets`:
//!
//! ```xml
//! <addon id="plugin.video.example" name="Example" version="1.2.3">
//!   <extension point="xbmc.addon.metadata">
//!     <assets>
//!       <icon>resources/icon.png</icon>
//!       <fanart>resources/fanart.jpg</fanart>
//!     </assets>
//!   </extension>
//! </addon>
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::publisher::{PublishError, PublishResult};

/// Byte-order mark some editors prepend to UTF-8 files.
const UTF8_BOM: char = '\u{feff}';

/// Icon and fanart paths, relative to the addon root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestAssets {
    pub icon: Option<String>,
    pub fanart: Option<String>,
}

impl ManifestAssets {
    /// Declared assets as `(kind, relative path)` pairs.
    pub fn declared(&self) -> Vec<(&'static str, &str)> {
        let mut assets = Vec::new();
        if let Some(icon) = &self.icon {
            assets.push(("icon", icon.as_str()));
        }
        if let Some(fanart) = &self.fanart {
            assets.push(("fanart", fanart.as_str()));
        }
        assets
    }
}

/// Parsed addon manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// File the manifest was read from.
    pub path: PathBuf,

    /// Addon id (`id` attribute).
    pub id: Option<String>,

    /// Display name (`name` attribute).
    pub name: Option<String>,

    /// Version string (`version` attribute), kept verbatim.
    pub version: Option<String>,

    /// Declared assets.
    pub assets: ManifestAssets,
}

/// Read a manifest file as text.
///
/// A missing file is reported as [`PublishError::ManifestMissing`] so callers
/// can tell "no manifest" apart from an I/O fault.
pub(crate) fn read_text(path: &Path) -> PublishResult<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PublishError::ManifestMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(PublishError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let text = String::from_utf8(bytes).map_err(|e| PublishError::ManifestInvalid {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e),
    })?;

    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn read(path: &Path) -> PublishResult<Self> {
        let text = read_text(path)?;
        Self::parse(&text, path)
    }

    /// Parse manifest XML. `path` is only used for error reporting.
    pub fn parse(xml: &str, path: &Path) -> PublishResult<Self> {
        let invalid = |reason: String| PublishError::ManifestInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let mut manifest = Manifest {
            path: path.to_path_buf(),
            id: None,
            name: None,
            version: None,
            assets: ManifestAssets::default(),
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut root_seen = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if stack.is_empty() {
                        if root_seen {
                            return Err(invalid("multiple root elements".to_string()));
                        }
                        root_seen = true;
                        manifest.read_root_attributes(&e, path)?;
                    }
                    stack.push(e.name().as_ref().to_vec());
                }
                Ok(Event::Empty(e)) => {
                    if stack.is_empty() {
                        if root_seen {
                            return Err(invalid("multiple root elements".to_string()));
                        }
                        root_seen = true;
                        manifest.read_root_attributes(&e, path)?;
                    }
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(text)) => {
                    let slot = match asset_kind(&stack) {
                        Some(AssetKind::Icon) => &mut manifest.assets.icon,
                        Some(AssetKind::Fanart) => &mut manifest.assets.fanart,
                        None => continue,
                    };
                    let value = text.unescape().map_err(|e| invalid(e.to_string()))?;
                    let value = value.trim();
                    if slot.is_none() && !value.is_empty() {
                        *slot = Some(value.to_string());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(invalid(format!(
                        "{} at position {}",
                        e,
                        reader.buffer_position()
                    )))
                }
            }
        }

        if !root_seen {
            return Err(invalid("no root element".to_string()));
        }
        if !stack.is_empty() {
            return Err(invalid("unexpected end of document".to_string()));
        }

        Ok(manifest)
    }

    fn read_root_attributes(&mut self, element: &BytesStart<'_>, path: &Path) -> PublishResult<()> {
        for attr in element.attributes() {
            let attr = attr.map_err(|e| PublishError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let value = attr
                .unescape_value()
                .map_err(|e| PublishError::ManifestInvalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .trim()
                .to_string();
            if value.is_empty() {
                continue;
            }

            match attr.key.as_ref() {
                b"version" => self.version = Some(value),
                b"id" => self.id = Some(value),
                b"name" => self.name = Some(value),
                _ => {}
            }
        }
        Ok(())
    }

    /// The declared version, required for packaging.
    pub fn version(&self) -> PublishResult<&str> {
        self.version
            .as_deref()
            .ok_or_else(|| PublishError::MissingVersion {
                path: self.path.clone(),
            })
    }
}

enum AssetKind {
    Icon,
    Fanart,
}

/// Which asset, if any, the innermost open element holds.
fn asset_kind(stack: &[Vec<u8>]) -> Option<AssetKind> {
    let [.., extension, assets, leaf] = stack else {
        return None;
    };
    if extension.as_slice() != b"extension" || assets.as_slice() != b"assets" {
        return None;
    }
    match leaf.as_slice() {
        b"icon" => Some(AssetKind::Icon),
        b"fanart" => Some(AssetKind::Fanart),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addon id="plugin.video.example" name="Example &amp; Co" version="1.2.3" provider-name="me">
  <requires>
    <import addon="xbmc.python" version="2.1.0"/>
  </requires>
  <extension point="xbmc.python.pluginsource" library="default.py">
    <provides>video</provides>
  </extension>
  <extension point="xbmc.addon.metadata">
    <summary lang="en">Example</summary>
    <assets>
      <icon>resources/icon.png</icon>
      <fanart> resources/fanart.jpg </fanart>
    </assets>
  </extension>
</addon>
"#;

    fn parse(xml: &str) -> PublishResult<Manifest> {
        Manifest::parse(xml, Path::new("addon.xml"))
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(FULL).unwrap();
        assert_eq!(manifest.id.as_deref(), Some("plugin.video.example"));
        assert_eq!(manifest.name.as_deref(), Some("Example & Co"));
        assert_eq!(manifest.version().unwrap(), "1.2.3");
        assert_eq!(manifest.assets.icon.as_deref(), Some("resources/icon.png"));
        assert_eq!(
            manifest.assets.fanart.as_deref(),
            Some("resources/fanart.jpg")
        );
    }

    #[test]
    fn test_nested_version_attributes_ignored() {
        // The import element's version must not leak into the addon version.
        let xml = r#"<addon id="x"><requires><import version="9.9"/></requires></addon>"#;
        let manifest = parse(xml).unwrap();
        assert!(manifest.version.is_none());
        assert!(matches!(
            manifest.version(),
            Err(PublishError::MissingVersion { .. })
        ));
    }

    #[test]
    fn test_parse_without_assets() {
        let manifest = parse(r#"<addon version="1.0"/>"#).unwrap();
        assert_eq!(manifest.version().unwrap(), "1.0");
        assert!(manifest.assets.declared().is_empty());
    }

    #[test]
    fn test_assets_outside_extension_ignored() {
        let xml = r#"<addon version="1.0"><assets><icon>icon.png</icon></assets></addon>"#;
        let manifest = parse(xml).unwrap();
        assert!(manifest.assets.icon.is_none());
    }

    #[test]
    fn test_malformed_mismatched_tags() {
        let result = parse(r#"<addon version="1.0"><extension></addon>"#);
        assert!(matches!(result, Err(PublishError::ManifestInvalid { .. })));
    }

    #[test]
    fn test_malformed_unterminated() {
        let result = parse(r#"<addon version="1.0"><extension>"#);
        assert!(matches!(result, Err(PublishError::ManifestInvalid { .. })));
    }

    #[test]
    fn test_empty_document() {
        let result = parse("");
        assert!(matches!(result, Err(PublishError::ManifestInvalid { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Manifest::read(&temp.path().join("addon.xml"));
        let err = result.unwrap_err();
        assert!(matches!(err, PublishError::ManifestMissing { .. }));
        assert!(err.is_expected());
    }

    #[test]
    fn test_read_text_strips_bom() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("addon.xml");
        fs::write(&path, "\u{feff}<addon version=\"2.0\"/>").unwrap();

        let text = read_text(&path).unwrap();
        assert!(text.starts_with("<addon"));
        assert_eq!(Manifest::read(&path).unwrap().version().unwrap(), "2.0");
    }

    #[test]
    fn test_read_text_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("addon.xml");
        fs::write(&path, [0x3c, 0xff, 0xfe, 0x3e]).unwrap();

        assert!(matches!(
            read_text(&path),
            Err(PublishError::ManifestInvalid { .. })
        ));
    }
}
