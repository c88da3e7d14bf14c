use dupcull::actions::{remove_duplicates, DeleteConfig, DeleteError};
use dupcull::duplicates::{ConsistencyError, DuplicateFinder, FinderConfig};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_scan_then_remove_keeps_one_copy() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let keep = dir1.path().join("photo.jpg");
    let copy1 = dir2.path().join("photo.jpg");
    let copy2 = dir2.path().join("photo (1).jpg");
    for path in [&keep, &copy1, &copy2] {
        fs::write(path, vec![0x42u8; 10_000]).unwrap();
    }
    fs::write(dir2.path().join("other.jpg"), vec![0x43u8; 10_000]).unwrap();

    let mut finder = DuplicateFinder::new(FinderConfig::default().with_sample_size(1024));
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();
    assert_eq!(summary.reclaimable_space, 20_000);

    let report = remove_duplicates(&groups, &DeleteConfig::remove()).unwrap();

    assert_eq!(report.removed_count(), 2);
    assert_eq!(report.bytes_freed, 20_000);
    assert!(keep.exists());
    assert!(!copy1.exists());
    assert!(!copy2.exists());
    assert!(dir2.path().join("other.jpg").exists());
}

#[test]
fn test_dry_run_reports_without_deleting() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();

    let mut finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let report = remove_duplicates(&groups, &DeleteConfig::dry_run()).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.removed_count(), 1);
    assert!(report.summary().starts_with("Would remove file count: 1"));
    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());
}

#[test]
fn test_file_grown_after_scan_stops_removal() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), b"identical").unwrap();
    }

    let mut finder = DuplicateFinder::new(FinderConfig::default().with_sample_size(4));
    let (groups, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].remove.len(), 2);

    // The first file due for removal changes under us
    let changed = groups[0].remove[0].path.clone();
    let untouched = groups[0].remove[1].path.clone();
    fs::write(&changed, b"identical, now longer").unwrap();

    let err = remove_duplicates(&groups, &DeleteConfig::remove()).unwrap_err();
    assert!(matches!(
        err,
        DeleteError::Consistency(ConsistencyError::SizeMismatch { ref path, .. }) if *path == changed
    ));
    assert!(changed.exists());
    assert!(untouched.exists());
}

#[test]
fn test_interrupt_before_removal_deletes_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();

    let mut finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    flag.store(true, Ordering::SeqCst);
    let config = DeleteConfig::remove().with_shutdown_flag(flag);

    assert!(matches!(
        remove_duplicates(&groups, &config),
        Err(DeleteError::Interrupted)
    ));
    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());
}
