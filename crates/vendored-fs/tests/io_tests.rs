//! Tests for atomic writes, list files and directory pruning

use std::fs;

use assert_fs::prelude::*;
use pretty_assertions::assert_eq;
use predicates::prelude::*;
use tempfile::TempDir;
use vendored_fs::io::{
    prune_empty_dirs, read_lines, read_text, remove_file_if_exists, write_atomic,
    write_sorted_lines,
};
use vendored_fs::{NormalizedPath, load_object, save_object};

#[test]
fn test_write_atomic_creates_parent_dirs() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("a/b/c.txt"));

    write_atomic(&path, b"content").unwrap();

    assert_eq!(read_text(&path).unwrap(), "content");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.json"));

    write_atomic(&path, b"{}").unwrap();
    write_atomic(&path, b"{\"vendors\": {}}").unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["config.json".to_string()]);
}

#[test]
fn test_sorted_lines_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("manifests/tool.files"));

    write_sorted_lines(&path, ["b.txt", "a.txt", "b.txt", "  ", "c/d.sh"]).unwrap();

    assert_eq!(read_text(&path).unwrap(), "a.txt\nb.txt\nc/d.sh\n");
    assert_eq!(
        read_lines(&path).unwrap(),
        Some(vec!["a.txt".to_string(), "b.txt".to_string(), "c/d.sh".to_string()])
    );
}

#[test]
fn test_read_lines_missing_is_none() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.deps"));
    assert_eq!(read_lines(&path).unwrap(), None);
}

#[test]
fn test_remove_file_if_exists() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("gone.txt");
    file.write_str("x").unwrap();
    let path = NormalizedPath::new(file.path());

    assert!(remove_file_if_exists(&path).unwrap());
    assert!(!remove_file_if_exists(&path).unwrap());
    file.assert(predicate::path::missing());
}

#[test]
fn test_prune_stops_at_boundary_and_non_empty() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".vendored/pkg/tool/sub").create_dir_all().unwrap();
    temp.child(".vendored/manifests/other.files").write_str("x\n").unwrap();
    let root = NormalizedPath::new(temp.path());
    let control = root.join(".vendored");

    let removed = prune_empty_dirs(
        &root.join(".vendored/pkg/tool/sub"),
        &[root.clone(), control.clone()],
    )
    .unwrap();

    assert_eq!(removed.len(), 3);
    temp.child(".vendored/pkg").assert(predicate::path::missing());
    temp.child(".vendored").assert(predicate::path::is_dir());
}

#[test]
fn test_prune_never_removes_stop_dir_even_if_empty() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".vendored/pkg").create_dir_all().unwrap();
    let root = NormalizedPath::new(temp.path());
    let control = root.join(".vendored");

    prune_empty_dirs(&root.join(".vendored/pkg"), &[root.clone(), control]).unwrap();

    temp.child(".vendored").assert(predicate::path::is_dir());
    temp.child(".vendored/pkg").assert(predicate::path::missing());
}

#[test]
fn test_json_object_round_trip_preserves_unknown_keys() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("configs/tool.json"));
    let mut object = serde_json::Map::new();
    object.insert("_vendor".into(), serde_json::json!({"repo": "owner/tool"}));
    object.insert("custom".into(), serde_json::json!({"nested": [1, 2]}));

    save_object(&path, &object).unwrap();
    let loaded = load_object(&path).unwrap().unwrap();

    assert_eq!(loaded, object);
    assert!(read_text(&path).unwrap().ends_with('\n'));
}

#[test]
fn test_load_object_rejects_arrays_and_garbage() {
    let temp = TempDir::new().unwrap();
    let array = temp.path().join("array.json");
    let garbage = temp.path().join("garbage.json");
    fs::write(&array, "[1]").unwrap();
    fs::write(&garbage, "not json").unwrap();

    assert!(matches!(
        load_object(&NormalizedPath::new(&array)),
        Err(vendored_fs::Error::NotAnObject { .. })
    ));
    assert!(matches!(
        load_object(&NormalizedPath::new(&garbage)),
        Err(vendored_fs::Error::JsonParse { .. })
    ));
    assert!(load_object(&NormalizedPath::new(temp.path().join("none.json"))).unwrap().is_none());
}
