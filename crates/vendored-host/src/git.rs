//! Local source control
//!
//! Reads (staged paths, current branch) and the branch/stage/commit steps of
//! publishing go through git2. Pushing shells out to `git` so the user's
//! credential helpers apply.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, Signature};

use crate::process::{display_command, run_captured};
use crate::{Error, Result};

const BOT_NAME: &str = "github-actions[bot]";
const BOT_EMAIL: &str = "github-actions[bot]@users.noreply.github.com";

/// Operations on the host repository's checkout.
pub trait SourceControl {
    /// Current branch name; `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Repository-relative paths staged for the next commit, sorted.
    fn staged_files(&self) -> Result<Vec<String>>;

    /// Create `name` at HEAD and switch to it, keeping working-tree changes.
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Stage every addition, modification and deletion.
    fn stage_all(&self) -> Result<()>;

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.staged_files()?.is_empty())
    }

    fn commit(&self, message: &str) -> Result<()>;

    fn push(&self, branch: &str) -> Result<()>;
}

/// [`SourceControl`] over a real git repository.
pub struct GitRepository {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| Error::NotARepository {
            path: path.to_path_buf(),
        })?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::NotARepository {
                path: path.to_path_buf(),
            })?;
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo.head().ok().and_then(|h| h.peel_to_commit().ok())
    }
}

impl SourceControl for GitRepository {
    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .map(|target| target.trim_start_matches("refs/heads/").to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn staged_files(&self) -> Result<Vec<String>> {
        let head_tree = match self.head_commit() {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };
        let index = self.repo.index()?;
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            let file = if delta.new_file().path().is_some() {
                delta.new_file()
            } else {
                delta.old_file()
            };
            if let Some(path) = file.path() {
                paths.insert(path.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(paths.into_iter().collect())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        if let Some(commit) = self.head_commit() {
            self.repo.branch(name, &commit, true)?;
        }
        self.repo.set_head(&format!("refs/heads/{name}"))?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let signature = Signature::now(BOT_NAME, BOT_EMAIL)?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.head_commit();
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        let args = ["push", "--set-upstream", "origin", branch];
        let output = run_captured("git", &args, &self.workdir, &[])?;
        if output.success() {
            Ok(())
        } else {
            Err(output.into_error(display_command("git", &args)))
        }
    }
}
