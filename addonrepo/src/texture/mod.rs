//! Texture packing.
//!
//! Skins and some addons ship their images packed into a single
//! `Textures.xbt` built by an external packer. When packing succeeds the loose
//! images can be left out of the archive (see
//! [`MediaImagePolicy`](crate::config::MediaImagePolicy)).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::addon::AddonDescriptor;
use crate::config::RepoConfig;
use crate::publisher::{PublishError, PublishResult};
use crate::tool::run_tool;

/// Name of the packed texture file inside the media folder.
pub const PACKED_TEXTURE_FILENAME: &str = "Textures.xbt";

/// Trait for texture packer implementations.
pub trait TexturePacker {
    /// Pack every image under `input_dir` into `output_file`.
    fn pack(&self, input_dir: &Path, output_file: &Path) -> PublishResult<()>;
}

/// External `TexturePacker` executable.
#[derive(Debug, Clone)]
pub struct TexturePackerCli {
    executable: PathBuf,
}

impl TexturePackerCli {
    /// Use the packer at `executable`.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}

impl TexturePacker for TexturePackerCli {
    fn pack(&self, input_dir: &Path, output_file: &Path) -> PublishResult<()> {
        run_tool(
            &self.tool_name(),
            Command::new(&self.executable)
                .arg("-dupecheck")
                .arg("-input")
                .arg(input_dir)
                .arg("-output")
                .arg(output_file),
        )?;
        Ok(())
    }
}

/// Texture input folder and packed output for an addon.
///
/// The media folder is packed when present, otherwise the first existing
/// source-only folder. The packed file always lands in the media folder.
/// Returns `None` when the addon has neither.
pub fn texture_paths(addon: &AddonDescriptor, config: &RepoConfig) -> Option<(PathBuf, PathBuf)> {
    let media = addon.path.join(&config.media_folder);
    let input = if media.is_dir() {
        media.clone()
    } else {
        config
            .source_only_folders
            .iter()
            .map(|folder| addon.path.join(folder))
            .find(|dir| dir.is_dir())?
    };
    Some((input, media.join(PACKED_TEXTURE_FILENAME)))
}

/// Pack one addon's textures.
///
/// Returns the packed file, or `None` if the addon has nothing to pack.
pub fn pack_addon(
    packer: &dyn TexturePacker,
    addon: &AddonDescriptor,
    config: &RepoConfig,
) -> PublishResult<Option<PathBuf>> {
    let Some((input, output)) = texture_paths(addon, config) else {
        return Ok(None);
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::CreateDirectoryFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    packer.pack(&input, &output)?;
    info!("Packed textures of {} into {}", addon.name, output.display());
    Ok(Some(output))
}
