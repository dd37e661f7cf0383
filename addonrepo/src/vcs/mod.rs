//! Source control abstraction for testability.
//!
//! The publisher never runs `git` itself; it talks to a
//! [`SourceControlClient`]. [`GitCli`] is the production implementation and
//! tests inject fakes.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::GitConfig;
use crate::publisher::PublishResult;
use crate::tool::{failure, run_tool, spawn};

const GIT: &str = "git";

/// Result of a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created.
    Committed,

    /// The given paths had no changes, so no commit was made.
    NothingToCommit,
}

/// Trait for source control operations on the repository working tree.
pub trait SourceControlClient {
    /// Update the working tree and its submodules from the remote.
    fn pull(&self, root: &Path) -> PublishResult<()>;

    /// Stage `paths` and commit them with `message`.
    ///
    /// # Arguments
    ///
    /// * `root` - Working tree root
    /// * `paths` - Files and directories to stage
    /// * `message` - Commit message
    fn commit(&self, root: &Path, paths: &[PathBuf], message: &str)
        -> PublishResult<CommitOutcome>;

    /// Push `branch` to `remote`.
    fn push(&self, root: &Path, remote: &str, branch: &str) -> PublishResult<()>;
}

/// `git` command-line client.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    ssh_command: Option<String>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(GIT),
            ssh_command: None,
        }
    }

    /// Build a client from the `[git]` settings.
    pub fn from_config(config: &GitConfig) -> Self {
        Self {
            program: PathBuf::from(GIT),
            ssh_command: config.ssh_command.clone(),
        }
    }

    /// Use a specific `git` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, root: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.current_dir(root);
        if let Some(ssh) = &self.ssh_command {
            command.env("GIT_SSH_COMMAND", ssh);
        }
        command
    }
}

/// Paths relative to `root`, so `git add` sees repository paths.
///
/// Paths outside the working tree cannot be staged and are skipped.
fn pathspecs(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|p| match p.strip_prefix(root) {
            Ok(rel) => Some(rel.to_path_buf()),
            Err(_) if p.is_relative() => Some(p.clone()),
            Err(_) => {
                warn!("Not committing {}: outside {}", p.display(), root.display());
                None
            }
        })
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

impl SourceControlClient for GitCli {
    fn pull(&self, root: &Path) -> PublishResult<()> {
        info!("Pulling {}", root.display());
        run_tool(GIT, self.command(root).arg("pull"))?;
        run_tool(
            GIT,
            self.command(root)
                .args(["submodule", "update", "--init", "--recursive", "--remote"]),
        )?;
        Ok(())
    }

    fn commit(
        &self,
        root: &Path,
        paths: &[PathBuf],
        message: &str,
    ) -> PublishResult<CommitOutcome> {
        let specs = pathspecs(root, paths);
        if specs.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }

        run_tool(GIT, self.command(root).args(["add", "-A", "--"]).args(&specs))?;

        // --quiet exits 1 when there are staged changes.
        let staged = spawn(GIT, self.command(root).args(["diff", "--cached", "--quiet"]))?;
        match staged.status.code() {
            Some(0) => {
                debug!("Nothing to commit in {}", root.display());
                return Ok(CommitOutcome::NothingToCommit);
            }
            Some(1) => {}
            _ => return Err(failure(GIT, &staged)),
        }

        run_tool(GIT, self.command(root).args(["commit", "-m", message]))?;
        info!("Committed {} paths in {}", specs.len(), root.display());
        Ok(CommitOutcome::Committed)
    }

    fn push(&self, root: &Path, remote: &str, branch: &str) -> PublishResult<()> {
        run_tool(GIT, self.command(root).args(["push", remote, branch]))?;
        info!("Pushed {} to {}", branch, remote);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::PublishError;

    #[test]
    fn test_pathspecs_relative_to_root() {
        let root = Path::new("/repo");
        let paths = vec![
            PathBuf::from("/repo/addons.xml"),
            PathBuf::from("/repo/plugin.a"),
            PathBuf::from("/elsewhere/file"),
            PathBuf::from("/repo"),
        ];
        assert_eq!(
            pathspecs(root, &paths),
            vec![PathBuf::from("addons.xml"), PathBuf::from("plugin.a")]
        );
    }

    #[test]
    fn test_commit_with_only_outside_paths_is_noop() {
        let git = GitCli::new().with_program("nonexistent_git_xyz");
        let paths = vec![PathBuf::from("/dist/plugin.a"), PathBuf::from("/dist/addons.xml")];
        let outcome = git.commit(Path::new("/repo"), &paths, "msg").unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
    }

    #[test]
    fn test_missing_git_is_fatal() {
        let git = GitCli::new().with_program("nonexistent_git_xyz");
        let err = git.pull(Path::new(".")).unwrap_err();
        assert!(matches!(err, PublishError::ToolNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_commit_without_paths_is_noop() {
        let git = GitCli::new().with_program("nonexistent_git_xyz");
        let outcome = git.commit(Path::new("/repo"), &[], "msg").unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
    }

    #[test]
    fn test_from_config_carries_ssh_command() {
        let config = GitConfig {
            ssh_command: Some("ssh -i key".to_string()),
            ..GitConfig::default()
        };
        let git = GitCli::from_config(&config);
        let command = git.command(Path::new("."));
        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].0, "GIT_SSH_COMMAND");
    }
}
