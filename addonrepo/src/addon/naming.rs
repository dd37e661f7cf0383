//! Addon archive naming conventions.
//!
//! Archive filenames and in-archive entry names are built here and nowhere
//! else, so the packager and anything inspecting its output agree.

use std::path::{Component, Path};

/// Archive filename for an addon at a version.
///
/// # Examples
///
/// ```
/// use addonrepo::addon::archive_filename;
///
/// assert_eq!(
///     archive_filename("plugin.video.test", "1.2.3", "zip"),
///     "plugin.video.test-1.2.3.zip"
/// );
/// ```
pub fn archive_filename(addon_name: &str, version: &str, extension: &str) -> String {
    format!("{}-{}.{}", addon_name, version, extension)
}

/// Entry name inside the archive for a path relative to the addon root.
///
/// Entries are prefixed with the addon name and always use `/` separators.
/// Directory entries end in `/`. An empty relative path names the addon's
/// root directory.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use addonrepo::addon::archive_entry_name;
///
/// assert_eq!(
///     archive_entry_name("plugin.test", Path::new("resources/lib/main.py"), false),
///     "plugin.test/resources/lib/main.py"
/// );
/// assert_eq!(archive_entry_name("plugin.test", Path::new(""), true), "plugin.test/");
/// ```
pub fn archive_entry_name(addon_name: &str, relative: &Path, is_dir: bool) -> String {
    let mut name = addon_name.to_string();

    for component in relative.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }

    if is_dir {
        name.push('/');
    }

    name
}
