//! Scripted [`SourceControl`].

use std::cell::RefCell;

use vendored_host::{Result, SourceControl};

/// A checkout whose state is declared by the test.
///
/// Files passed to [`with_unstaged`](Self::with_unstaged) become staged on
/// `stage_all`; `commit` clears the staged set.
#[derive(Debug, Default)]
pub struct FakeSourceControl {
    branch: RefCell<Option<String>>,
    staged: RefCell<Vec<String>>,
    unstaged: RefCell<Vec<String>>,
    branches: RefCell<Vec<String>>,
    commits: RefCell<Vec<String>>,
    pushes: RefCell<Vec<String>>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_branch(self, name: &str) -> Self {
        *self.branch.borrow_mut() = Some(name.to_string());
        self
    }

    pub fn with_staged(self, files: &[&str]) -> Self {
        self.staged
            .borrow_mut()
            .extend(files.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_unstaged(self, files: &[&str]) -> Self {
        self.unstaged
            .borrow_mut()
            .extend(files.iter().map(|f| f.to_string()));
        self
    }

    pub fn created_branches(&self) -> Vec<String> {
        self.branches.borrow().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.borrow().clone()
    }
}

impl SourceControl for FakeSourceControl {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.borrow().clone())
    }

    fn staged_files(&self) -> Result<Vec<String>> {
        let mut files = self.staged.borrow().clone();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.branches.borrow_mut().push(name.to_string());
        *self.branch.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let pending: Vec<String> = self.unstaged.borrow_mut().drain(..).collect();
        self.staged.borrow_mut().extend(pending);
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.commits.borrow_mut().push(message.to_string());
        self.staged.borrow_mut().clear();
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.pushes.borrow_mut().push(branch.to_string());
        Ok(())
    }
}
