use dupcull::duplicates::{DuplicateFinder, FinderConfig};
use std::fs;
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn test_hardlinks_are_one_file() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original");
    let link = dir.path().join("link");
    fs::write(&original, b"hardlinked content").unwrap();
    fs::hard_link(&original, &link).unwrap();

    let mut finder = DuplicateFinder::new(FinderConfig::default().with_sample_size(8));
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    // Two names, one file: nothing to remove
    assert!(groups.is_empty());
    assert_eq!(summary.hardlinks_collapsed, 1);
    assert_eq!(summary.candidates.files, 1);
}

#[cfg(unix)]
#[test]
fn test_hardlink_plus_real_copy() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("a");
    fs::write(&original, b"shared bytes").unwrap();
    fs::hard_link(&original, dir.path().join("b")).unwrap();
    fs::write(dir.path().join("c"), b"shared bytes").unwrap();

    let mut finder = DuplicateFinder::new(FinderConfig::default().with_sample_size(8));
    let (groups, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_ne!(groups[0].keep.id, groups[0].remove[0].id);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target");
    fs::write(&target, b"only one real file").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("alias")).unwrap();

    let mut finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.scanned_files, 1);
}

#[test]
fn test_empty_files_are_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), b"").unwrap();
    fs::write(dir.path().join("e2"), b"").unwrap();

    let mut finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert!(summary.early_exit);
    assert_eq!(summary.scanned_files, 0);
}
