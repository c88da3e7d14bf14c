use dupcull::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_sample_size(64))
}

#[test]
fn test_first_root_wins() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let dir3 = tempdir().unwrap();
    for dir in [&dir3, &dir2, &dir1] {
        fs::write(dir.path().join("copy.bin"), vec![9u8; 4096]).unwrap();
    }

    let roots = vec![
        dir2.path().to_path_buf(),
        dir1.path().to_path_buf(),
        dir3.path().to_path_buf(),
    ];
    let (groups, _) = finder().find_duplicates_in_paths(&roots).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].keep.path.starts_with(dir2.path()));
    assert_eq!(groups[0].keep.priority, 3);
    let priorities: Vec<u32> = groups[0].remove.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![2, 1]);
}

#[test]
fn test_overlapping_roots_do_not_duplicate_files() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("a.txt"), b"content").unwrap();
    fs::write(sub.join("b.txt"), b"content").unwrap();

    // The nested root sees b.txt a second time
    let (groups, summary) = finder()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), sub.clone()])
        .unwrap();

    assert_eq!(summary.candidates.files, 2);
    assert_eq!(summary.hardlinks_collapsed, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    // First sighting came from the outer, higher priority root
    assert!(groups.iter().all(|g| g.keep.priority == 2 && g.remove[0].priority == 2));
}

#[test]
fn test_nested_directories_are_walked() {
    let dir = tempdir().unwrap();
    let deep = dir.path().join("a").join("b").join("c");
    fs::create_dir_all(&deep).unwrap();
    fs::write(dir.path().join("top"), b"nested duplicate").unwrap();
    fs::write(deep.join("bottom"), b"nested duplicate").unwrap();

    let (groups, _) = finder()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
}

#[test]
fn test_missing_root_is_rejected_before_scanning() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = finder()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), missing.clone()])
        .unwrap_err();
    assert!(matches!(err, FinderError::PathNotFound(ref p) if *p == missing));
}

#[test]
fn test_file_root_is_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain");
    fs::write(&file, b"x").unwrap();

    let err = finder().find_duplicates_in_paths(&[file]).unwrap_err();
    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[test]
fn test_no_roots() {
    let err = finder()
        .find_duplicates_in_paths(&Vec::<PathBuf>::new())
        .unwrap_err();
    assert!(matches!(err, FinderError::NoDirectories));
}
