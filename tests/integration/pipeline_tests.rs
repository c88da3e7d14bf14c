use dupcull::duplicates::{ConsistencyError, DuplicateFinder, FinderConfig, FinderError};
use dupcull::scanner::{FileId, FileRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn finder(sample_size: u64) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_sample_size(sample_size))
}

#[test]
fn test_four_file_scenario_from_records() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let f1 = write(dir1.path(), "f1", b"AAAA1111");
    let f2 = write(dir1.path(), "f2", b"AAAA2222");
    let f3 = write(dir1.path(), "f3", b"AAAA1111");
    let f4 = write(dir2.path(), "f4", b"AAAA1111");

    let mut finder = finder(4);
    // Added in an order that differs from the expected output
    finder.add_record(FileRecord::new(1, f4.clone(), FileId::new(1, 20), 8));
    finder.add_record(FileRecord::new(2, f3.clone(), FileId::new(1, 12), 8));
    finder.add_record(FileRecord::new(2, f2.clone(), FileId::new(1, 11), 8));
    finder.add_record(FileRecord::new(2, f1.clone(), FileId::new(1, 10), 8));

    let (groups, summary) = finder.run_pipeline(4).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].keep.path, f1);
    let removed: Vec<_> = groups[0].remove.iter().map(|r| r.path.clone()).collect();
    assert_eq!(removed, vec![f3, f4]);
    assert!(groups
        .iter()
        .all(|g| g.keep.path != f2 && g.remove.iter().all(|r| r.path != f2)));

    assert_eq!(summary.after_size.files, 4);
    assert_eq!(summary.prefix.as_ref().unwrap().output_files, 4);
    assert_eq!(summary.suffix.as_ref().unwrap().output_files, 3);
    assert_eq!(summary.full.as_ref().unwrap().output_files, 3);
    assert_eq!(summary.reclaimable_space, 16);
}

#[test]
fn test_four_file_scenario_from_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    write(dir1.path(), "f1", b"AAAA1111");
    write(dir1.path(), "f2", b"AAAA2222");
    write(dir1.path(), "f3", b"AAAA1111");
    let f4 = write(dir2.path(), "f4", b"AAAA1111");

    let mut finder = finder(4);
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.scanned_files, 4);
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.remove.len(), 2);
    assert!(group.keep.path.starts_with(dir1.path()));
    assert_eq!(group.keep.priority, 2);
    assert!(group.remove.iter().any(|r| r.path == f4));
    assert!(group.remove.iter().all(|r| !r.path.ends_with("f2")));
}

#[test]
fn test_files_shorter_than_sample() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"abc");
    write(dir.path(), "b", b"abc");
    write(dir.path(), "c", b"abd");
    // 5 bytes with a 4 byte sample: prefix and suffix overlap
    write(dir.path(), "d", b"xyzzy");
    write(dir.path(), "e", b"xyzzy");
    write(dir.path(), "f", b"xyQzy");

    let mut finder = finder(4);
    let (groups, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 2);
    for group in &groups {
        assert_eq!(group.remove.len(), 1);
        let keep = fs::read(&group.keep.path).unwrap();
        let other = fs::read(&group.remove[0].path).unwrap();
        assert_eq!(keep, other);
    }
}

#[test]
fn test_same_prefix_and_suffix_different_middle() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"HEAD-one-TAIL");
    write(dir.path(), "b", b"HEAD-two-TAIL");

    let mut finder = finder(4);
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.suffix.as_ref().unwrap().output_files, 2);
    assert_eq!(summary.full.as_ref().unwrap().output_files, 0);
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same content");
    write(dir.path(), "b", b"same content");
    write(dir.path(), "c", b"different!!!");

    let mut finder = finder(4);
    let roots = [dir.path().to_path_buf()];
    let (first, _) = finder.find_duplicates_in_paths(&roots).unwrap();
    assert!(finder.stats().files == 0);
    let (second, _) = finder.find_duplicates_in_paths(&roots).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_duplicate_records_are_collapsed() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"payload");
    let b = write(dir.path(), "b", b"payload");

    let mut finder = finder(4);
    assert!(finder.add_record(FileRecord::new(1, a.clone(), FileId::new(7, 1), 7)));
    assert!(finder.add_record(FileRecord::new(1, b.clone(), FileId::new(7, 2), 7)));
    assert!(!finder.add_record(FileRecord::new(1, a, FileId::new(7, 1), 7)));
    assert_eq!(finder.stats().files, 2);

    let (groups, _) = finder.run_pipeline(4).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"12345678");
    let b = write(dir.path(), "b", b"12345678");
    let gone = dir.path().join("gone");

    let mut finder = finder(4);
    finder.add_record(FileRecord::new(1, a.clone(), FileId::new(1, 1), 8));
    finder.add_record(FileRecord::new(1, b.clone(), FileId::new(1, 2), 8));
    finder.add_record(FileRecord::new(1, gone.clone(), FileId::new(1, 3), 8));

    let (groups, summary) = finder.run_pipeline(4).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].keep.path, a);
    assert_eq!(groups[0].remove[0].path, b);
    assert_eq!(summary.read_failures.len(), 1);
    assert_eq!(summary.read_failures[0].path(), gone.as_path());
}

#[test]
fn test_size_change_before_resolution_is_fatal() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"12345678");
    let b = write(dir.path(), "b", b"12345678");

    // Recorded sizes no longer match what is on disk
    let mut finder = finder(4);
    finder.add_record(FileRecord::new(1, a, FileId::new(1, 1), 9));
    finder.add_record(FileRecord::new(1, b.clone(), FileId::new(1, 2), 9));

    match finder.run_pipeline(4) {
        Err(FinderError::Consistency(ConsistencyError::SizeMismatch {
            path,
            expected,
            actual,
        })) => {
            assert_eq!(path, b);
            assert_eq!(expected, 9);
            assert_eq!(actual, 8);
        }
        other => panic!("expected size mismatch, got {other:?}"),
    }
    assert!(finder.stats().files == 0);
}

#[test]
fn test_many_groups_with_one_worker() {
    let dir = tempdir().unwrap();
    for i in 0..40u8 {
        let content = vec![i; 64 + usize::from(i % 4)];
        write(dir.path(), &format!("x{i}"), &content);
        write(dir.path(), &format!("y{i}"), &content);
    }

    let config = FinderConfig::default()
        .with_sample_size(16)
        .with_max_workers(1);
    let mut finder = DuplicateFinder::new(config);
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 40);
    assert_eq!(summary.duplicate_files, 40);
    // Largest files first
    assert!(groups.windows(2).all(|w| w[0].size >= w[1].size));
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_reported_and_rest_grouped() {
    use dupcull::scanner::SampleError;

    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"12345678");
    let b = write(dir.path(), "b", b"12345678");
    let locked = write(dir.path(), "locked", b"12345678");
    set_mode(&locked, 0o000);

    // Privileged users can read it anyway
    if fs::read(&locked).is_ok() {
        set_mode(&locked, 0o644);
        return;
    }

    let result = finder(4).find_duplicates_in_paths(&[dir.path().to_path_buf()]);
    set_mode(&locked, 0o644);
    let (groups, summary) = result.unwrap();

    assert_eq!(summary.scanned_files, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    let mut members = vec![groups[0].keep.path.clone(), groups[0].remove[0].path.clone()];
    members.sort();
    assert_eq!(members, vec![a, b]);
    assert_eq!(summary.read_failures.len(), 1);
    assert!(matches!(
        &summary.read_failures[0],
        SampleError::PermissionDenied(p) if *p == locked
    ));
}

#[cfg(unix)]
#[test]
fn test_unlistable_subdirectory_skipped() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"12345678");
    let b = write(dir.path(), "b", b"12345678");
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write(&locked, "c", b"12345678");
    set_mode(&locked, 0o000);

    if fs::read_dir(&locked).is_ok() {
        set_mode(&locked, 0o755);
        return;
    }

    let result = finder(4).find_duplicates_in_paths(&[dir.path().to_path_buf()]);
    set_mode(&locked, 0o755);
    let (groups, summary) = result.unwrap();

    assert_eq!(summary.scan_errors, 0);
    assert_eq!(summary.scanned_files, 2);
    assert!(summary.read_failures.is_empty());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    let mut members = vec![groups[0].keep.path.clone(), groups[0].remove[0].path.clone()];
    members.sort();
    assert_eq!(members, vec![a, b]);
}
