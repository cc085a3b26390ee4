//! Directory subtree lifecycle: depth-first removal, idempotence, and the
//! destroy-then-create setup helper.

use std::path::{Path, PathBuf};

use vignette::foundation::fs;

fn test_root(name: &str) -> PathBuf {
    Path::new("target").join("fs-tree-tests").join(name)
}

#[test]
fn remove_tree_deletes_nested_files_and_directories() {
    let root = test_root("nested");
    fs::ensure_dir(&root.join("a").join("b")).unwrap();
    std::fs::write(root.join("top.txt"), b"top").unwrap();
    std::fs::write(root.join("a").join("mid.txt"), b"mid").unwrap();
    std::fs::write(root.join("a").join("b").join("leaf.txt"), b"leaf").unwrap();

    fs::remove_tree(&root).unwrap();
    assert!(!root.exists());
}

#[test]
fn remove_tree_is_a_no_op_on_a_missing_root() {
    let root = test_root("never-created");
    fs::remove_tree(&root).unwrap();
    fs::remove_tree(&root).unwrap();
    assert!(!root.exists());
}

#[test]
fn remove_tree_leaves_plain_files_alone() {
    let dir = test_root("plain-file");
    fs::ensure_dir(&dir).unwrap();
    let file = dir.join("keep.txt");
    std::fs::write(&file, b"keep").unwrap();

    // Only directory roots are removed.
    fs::remove_tree(&file).unwrap();
    assert!(file.exists());
}

#[test]
fn fresh_dir_guarantees_an_empty_directory() {
    let root = test_root("fresh");
    fs::ensure_dir(&root.join("stale")).unwrap();
    std::fs::write(root.join("stale.txt"), b"stale").unwrap();

    fs::fresh_dir(&root).unwrap();
    assert!(root.is_dir());
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn fresh_dir_creates_missing_ancestors() {
    let root = test_root("deep").join("x").join("y");
    fs::remove_tree(&test_root("deep")).unwrap();
    fs::fresh_dir(&root).unwrap();
    assert!(root.is_dir());
}
