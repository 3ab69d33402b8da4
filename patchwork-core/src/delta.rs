//! Delta engine: classify local changes against the stored patch set.

use crate::types::{Delta, FileOperation, PatchSet};

/// Compare the live working-tree patch set against the store.
///
/// Every non-Deleted store path lands in exactly one of NeedsUpdate,
/// NeedsApply or UpToDate. Deleted store entries are always surfaced. A local
/// path is orphaned only when the store has no entry for it at all.
pub fn compare(local: &PatchSet, store: &PatchSet) -> Delta {
    let mut delta = Delta::default();

    for (path, stored) in store.iter() {
        if stored.operation == FileOperation::Deleted {
            delta.deleted.push(path.clone());
            continue;
        }
        match local.get(path) {
            None => delta.needs_apply.push(path.clone()),
            Some(live) => {
                let live = live.content.as_deref().unwrap_or_default();
                let stored = stored.content.as_deref().unwrap_or_default();
                if contents_equal(live, stored) {
                    delta.up_to_date.push(path.clone());
                } else {
                    delta.needs_update.push(path.clone());
                }
            }
        }
    }

    for path in local.patches.keys() {
        if !store.contains(path) {
            delta.orphaned.push(path.clone());
        }
    }

    delta
}

/// Drop `index ` lines and trailing spaces/tabs so blob-hash and whitespace
/// churn does not register as a change.
pub fn normalize_patch(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut first = true;
    for line in content.split(|b| *b == b'\n') {
        if line.starts_with(b"index ") {
            continue;
        }
        if !first {
            out.push(b'\n');
        }
        first = false;
        let keep = line
            .iter()
            .rposition(|b| *b != b' ' && *b != b'\t')
            .map_or(0, |i| i + 1);
        out.extend_from_slice(&line[..keep]);
    }
    out
}

pub fn contents_equal(a: &[u8], b: &[u8]) -> bool {
    a == b || normalize_patch(a) == normalize_patch(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilePatch;
    use rstest::rstest;

    fn set(entries: &[(&str, FileOperation, &str)]) -> PatchSet {
        entries
            .iter()
            .map(|(path, op, body)| match op {
                FileOperation::Deleted => FilePatch::deleted(*path),
                FileOperation::Binary => FilePatch::binary(*path),
                _ => FilePatch::with_content(*path, *op, body.as_bytes()),
            })
            .collect()
    }

    #[test]
    fn five_way_classification() {
        let local = set(&[
            ("same.cc", FileOperation::Modified, "diff\n+a\n"),
            ("drift.cc", FileOperation::Modified, "diff\n+old\n"),
            ("local_only.cc", FileOperation::Added, "diff\n+x\n"),
            ("gone.cc", FileOperation::Modified, "diff\n-y\n"),
        ]);
        let store = set(&[
            ("same.cc", FileOperation::Modified, "diff\n+a\n"),
            ("drift.cc", FileOperation::Modified, "diff\n+new\n"),
            ("store_only.cc", FileOperation::Added, "diff\n+z\n"),
            ("gone.cc", FileOperation::Deleted, ""),
        ]);

        let delta = compare(&local, &store);
        assert_eq!(delta.up_to_date, vec!["same.cc".to_string()]);
        assert_eq!(delta.needs_update, vec!["drift.cc".to_string()]);
        assert_eq!(delta.needs_apply, vec!["store_only.cc".to_string()]);
        assert_eq!(delta.orphaned, vec!["local_only.cc".to_string()]);
        assert_eq!(delta.deleted, vec!["gone.cc".to_string()]);
    }

    #[test]
    fn every_live_store_path_lands_in_one_category() {
        let local = set(&[
            ("a", FileOperation::Modified, "1"),
            ("b", FileOperation::Modified, "2"),
        ]);
        let store = set(&[
            ("a", FileOperation::Modified, "1"),
            ("b", FileOperation::Modified, "3"),
            ("c", FileOperation::Binary, ""),
            ("d", FileOperation::Deleted, ""),
        ]);
        let delta = compare(&local, &store);
        for (path, patch) in store.iter() {
            if patch.operation == FileOperation::Deleted {
                continue;
            }
            let hits = [&delta.needs_update, &delta.needs_apply, &delta.up_to_date]
                .iter()
                .filter(|list| list.contains(path))
                .count();
            assert_eq!(hits, 1, "{path} classified {hits} times");
        }
        assert!(delta.orphaned.is_empty());
    }

    #[rstest]
    #[case("a\nindex 111..222 100644\nb\n", "a\nb\n")]
    #[case("a  \nb\t\t\n", "a\nb\n")]
    #[case("x \t\nindex abc\n", "x\n")]
    #[case("", "")]
    #[case("no newline", "no newline")]
    fn normalization_table(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_patch(input.as_bytes()), expected.as_bytes());
    }

    #[rstest]
    #[case("diff --git a/x b/x\nindex 1..2\n+a \n")]
    #[case("\n\n\t\nindex \n")]
    #[case("plain\r\ntext  ")]
    fn normalization_is_idempotent(#[case] input: &str) {
        let once = normalize_patch(input.as_bytes());
        assert_eq!(normalize_patch(&once), once);
    }

    #[test]
    fn index_and_whitespace_differences_are_equal() {
        let a = b"diff --git a/f b/f\nindex 1111..2222 100644\n+line\n";
        let b = b"diff --git a/f b/f\nindex 3333..4444 100644\n+line   \n";
        assert!(contents_equal(a, b));
        assert!(!contents_equal(a, b"diff --git a/f b/f\n+other\n"));
    }
}
