//! [`TestRepo`] builder for host repositories with a `.vendored/` directory.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;
use vendored_fs::ControlLayout;

/// A temporary host repository with helpers for setup and assertions.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use vendored_test_utils::TestRepo;
///
/// let repo = TestRepo::new();
/// repo.vendor_config("tool", json!({"repo": "owner/tool", "protected": [".tool/**"]}));
/// repo.manifest("tool", &[".tool/run.sh"]);
/// repo.assert_file_exists(".vendored/configs/tool.json");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// An empty directory with `.vendored/` created.
    pub fn new() -> Self {
        let repo = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(repo.root().join(".vendored")).unwrap();
        repo
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn layout(&self) -> ControlLayout {
        ControlLayout::new(self.root())
    }

    /// Make the directory a git repository with one commit on `main`.
    pub fn init_git(&self) {
        crate::git::real_git_repo_with_commit(self.root());
    }

    /// Write `content` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn write_json(&self, rel: &str, value: Value) {
        self.write(rel, &format!("{}\n", serde_json::to_string_pretty(&value).unwrap()));
    }

    pub fn read(&self, rel: &str) -> String {
        let path = self.root().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()))
    }

    pub fn read_json(&self, rel: &str) -> Value {
        serde_json::from_str(&self.read(rel)).unwrap()
    }

    /// `.vendored/config.json` with `vendors` as its vendor map.
    pub fn monolithic_config(&self, vendors: Value) {
        self.write_json(".vendored/config.json", json!({ "vendors": vendors }));
    }

    /// `.vendored/configs/<name>.json` with `descriptor` under `_vendor`.
    pub fn vendor_config(&self, name: &str, descriptor: Value) {
        self.write_json(
            &format!(".vendored/configs/{name}.json"),
            json!({ "_vendor": descriptor }),
        );
    }

    /// Write a `.files` manifest and create every listed file.
    pub fn manifest(&self, vendor: &str, files: &[&str]) {
        for file in files {
            if !self.root().join(file).exists() {
                self.write(file, "vendored\n");
            }
        }
        let mut lines: Vec<&str> = files.to_vec();
        lines.sort();
        let mut content = lines.join("\n");
        content.push('\n');
        self.write(&format!(".vendored/manifests/{vendor}.files"), &content);
    }

    pub fn manifest_version(&self, vendor: &str, version: &str) {
        self.write(&format!(".vendored/manifests/{vendor}.version"), &format!("{version}\n"));
    }

    pub fn manifest_deps(&self, vendor: &str, deps: &[&str]) {
        let mut content = deps.join("\n");
        content.push('\n');
        self.write(&format!(".vendored/manifests/{vendor}.deps"), &content);
    }

    /// Panics with the path if `rel` does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.root().join(rel);
        assert!(full_path.exists(), "Expected file to exist: {}", full_path.display());
    }

    pub fn assert_file_not_exists(&self, rel: &str) {
        let full_path = self.root().join(rel);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    pub fn assert_file_contains(&self, rel: &str, content: &str) {
        let file_content = self.read(rel);
        assert!(
            file_content.contains(content),
            "File {rel} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}
