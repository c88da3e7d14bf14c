use proptest::prelude::*;
use dupcull::duplicates::{bucket_by, remove_orphans, resolve, SampledRecord};
use dupcull::scanner::{FileId, FileRecord, Fingerprint};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn records(rows: &[(u64, u32, u64)]) -> Vec<FileRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, &(size, priority, ino))| {
            FileRecord::new(
                priority,
                PathBuf::from(format!("/fake/{i}")),
                FileId::new(1, ino),
                size,
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn test_orphan_invariant(sizes in prop::collection::vec(1u64..20, 0..60)) {
        let input = records(&sizes.iter().enumerate().map(|(i, &s)| (s, 1, i as u64)).collect::<Vec<_>>());
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for r in &input {
            *counts.entry(r.size).or_default() += 1;
        }

        let (kept, stats) = remove_orphans(bucket_by(input.clone(), |r| r.size));

        // Every survivor shares its size with at least one other survivor
        for r in &kept {
            prop_assert!(kept.iter().filter(|o| o.size == r.size).count() >= 2);
        }
        // Nothing with a partner is lost
        let expected: usize = counts.values().filter(|&&c| c >= 2).sum();
        prop_assert_eq!(kept.len(), expected);
        prop_assert_eq!(stats.kept_records + stats.dropped_records, input.len());
    }

    #[test]
    fn test_keep_selection_ignores_input_order(
        members in prop::collection::btree_map(0u64..1000, 1u32..4, 2..12),
        seed in any::<u64>(),
    ) {
        let dir = TempDir::new().unwrap();
        // Unique inodes, random priorities, real 64-byte files
        let sampled: Vec<SampledRecord> = members
            .iter()
            .map(|(&ino, &priority)| {
                let path = dir.path().join(format!("f{ino}"));
                fs::write(&path, [0u8; 64]).unwrap();
                SampledRecord {
                    record: FileRecord::new(priority, path, FileId::new(1, ino), 64),
                    fingerprint: Fingerprint::Digest([7; 32]),
                }
            })
            .collect();

        let mut shuffled = sampled.clone();
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            shuffled.swap(i, (state >> 33) as usize % (i + 1));
        }

        let a = resolve(sampled).unwrap();
        let b = resolve(shuffled).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), 1);

        let max_priority = members.values().copied().max().unwrap();
        let lowest_ino = members
            .iter()
            .filter(|(_, &p)| p == max_priority)
            .map(|(&ino, _)| ino)
            .min()
            .unwrap();
        prop_assert_eq!(a[0].keep.id.ino, lowest_ino);
        prop_assert_eq!(a[0].remove.len(), members.len() - 1);
    }
}

#[test]
fn test_resolve_rejects_missing_files_deterministically() {
    // Fake paths fail the size check, so resolve must error whatever the order
    let rows = [(8, 1, 3), (8, 1, 1), (8, 2, 9)];
    let sampled: Vec<SampledRecord> = records(&rows)
        .into_iter()
        .map(|record| SampledRecord { record, fingerprint: Fingerprint::Digest([1; 32]) })
        .collect();
    assert!(resolve(sampled).is_err());
}
