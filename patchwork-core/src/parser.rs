//! Multi-file unified diff parser.
//!
//! Input is the raw output of `git diff -M --full-index`. Each file section
//! starts at a `diff --git a/<old> b/<new>` line and runs until the next one.
//! The section bytes are kept verbatim as the patch content.

use crate::error::ParseError;
use crate::types::{FileOperation, FilePatch, PatchSet};

const HEADER_PREFIX: &[u8] = b"diff --git ";

/// Parse a full diff stream into one [`FilePatch`] per file section.
///
/// Bytes before the first header are ignored. Sections without a resolvable
/// destination path are dropped.
pub fn parse_unified_diff(raw: &[u8]) -> Result<PatchSet, ParseError> {
    let mut set = PatchSet::default();
    for chunk in split_chunks(raw) {
        if let Some(patch) = parse_chunk(chunk)? {
            set.insert(patch);
        }
    }
    Ok(set)
}

/// Split `raw` at every line beginning with the file header.
///
/// Each chunk keeps its own trailing newline.
pub fn split_chunks(raw: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut line_start = 0;
    while line_start < raw.len() {
        if raw[line_start..].starts_with(HEADER_PREFIX) {
            starts.push(line_start);
        }
        match raw[line_start..].iter().position(|b| *b == b'\n') {
            Some(offset) => line_start += offset + 1,
            None => break,
        }
    }

    let mut chunks = Vec::with_capacity(starts.len());
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(raw.len());
        chunks.push(&raw[*start..end]);
    }
    chunks
}

/// Parse one file section.
///
/// Returns `Ok(None)` when no destination path can be resolved.
pub fn parse_chunk(chunk: &[u8]) -> Result<Option<FilePatch>, ParseError> {
    let text = String::from_utf8_lossy(chunk);
    let mut lines = text.split('\n');
    let header = lines.next().unwrap_or_default().trim_end_matches('\r');
    if !header.starts_with("diff --git ") {
        return Err(ParseError {
            header: header.to_string(),
        });
    }

    let mut patch = FilePatch {
        path: header
            .split_once(" b/")
            .map(|(_, dest)| dest.to_string())
            .unwrap_or_default(),
        operation: FileOperation::Modified,
        content: Some(chunk.to_vec()),
        old_path: None,
        similarity: None,
    };

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.starts_with("diff --git ") || line.starts_with("@@") {
            break;
        }

        if line.starts_with("new file mode") {
            patch.operation = FileOperation::Added;
        } else if line.starts_with("deleted file mode") {
            patch.operation = FileOperation::Deleted;
        } else if let Some(old) = line.strip_prefix("rename from ") {
            patch.operation = FileOperation::Renamed;
            patch.old_path = Some(old.to_string());
        } else if let Some(new) = line.strip_prefix("rename to ") {
            patch.path = new.to_string();
        } else if let Some(rest) = line.strip_prefix("similarity index ") {
            patch.similarity = rest.trim_end_matches('%').trim().parse().ok();
        } else if line.contains("Binary files") {
            patch.operation = FileOperation::Binary;
        }
    }

    if patch.path.is_empty() {
        return Ok(None);
    }
    Ok(Some(patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MODIFIED: &str = "diff --git a/chrome/app.cc b/chrome/app.cc\n\
index 1111111111111111111111111111111111111111..2222222222222222222222222222222222222222 100644\n\
--- a/chrome/app.cc\n\
+++ b/chrome/app.cc\n\
@@ -1,3 +1,4 @@\n\
 int a;\n\
+int b;\n\
 int c;\n";

    const ADDED: &str = "diff --git a/foo/bar.cc b/foo/bar.cc\n\
new file mode 100644\n\
index 0000000000000000000000000000000000000000..3333333333333333333333333333333333333333\n\
--- /dev/null\n\
+++ b/foo/bar.cc\n\
@@ -0,0 +1 @@\n\
+int main() {}\n";

    #[test]
    fn modified_chunk_keeps_content_verbatim() {
        let set = parse_unified_diff(MODIFIED.as_bytes()).unwrap();
        let patch = set.get("chrome/app.cc").expect("patch");
        assert_eq!(patch.operation, FileOperation::Modified);
        assert_eq!(patch.content.as_deref(), Some(MODIFIED.as_bytes()));
    }

    #[test]
    fn new_file_mode_is_added() {
        let set = parse_unified_diff(ADDED.as_bytes()).unwrap();
        let patch = set.get("foo/bar.cc").expect("patch");
        assert_eq!(patch.path, "foo/bar.cc");
        assert_eq!(patch.operation, FileOperation::Added);
        assert!(patch.content.is_some());
    }

    #[test]
    fn multiple_chunks_split_on_header() {
        let raw = format!("{MODIFIED}{ADDED}");
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get("chrome/app.cc").unwrap().content.as_deref(),
            Some(MODIFIED.as_bytes())
        );
        assert_eq!(
            set.get("foo/bar.cc").unwrap().content.as_deref(),
            Some(ADDED.as_bytes())
        );
    }

    #[test]
    fn rename_chunk() {
        let raw = "diff --git a/old/path.h b/new/path.h\n\
similarity index 87%\n\
rename from old/path.h\n\
rename to new/path.h\n\
index 1111111..2222222 100644\n\
--- a/old/path.h\n\
+++ b/new/path.h\n\
@@ -1 +1 @@\n\
-a\n\
+b\n";
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        let patch = set.get("new/path.h").expect("renamed patch");
        assert_eq!(patch.operation, FileOperation::Renamed);
        assert_eq!(patch.old_path.as_deref(), Some("old/path.h"));
        assert_eq!(patch.similarity, Some(87));
    }

    #[test]
    fn rename_to_overrides_header_path() {
        let raw = "diff --git a/x b/garbled\nrename from x\nrename to y/z.cc\nsimilarity index 100%\n";
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert!(set.get("garbled").is_none());
        let patch = set.get("y/z.cc").unwrap();
        assert_eq!(patch.similarity, Some(100));
    }

    #[rstest]
    #[case("deleted file mode 100644", FileOperation::Deleted)]
    #[case("Binary files a/img.png and b/img.png differ", FileOperation::Binary)]
    #[case("new file mode 100755", FileOperation::Added)]
    #[case("old mode 100644", FileOperation::Modified)]
    fn header_line_sets_operation(#[case] line: &str, #[case] expected: FileOperation) {
        let raw = format!("diff --git a/img.png b/img.png\n{line}\n");
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert_eq!(set.get("img.png").unwrap().operation, expected);
    }

    #[test]
    fn markers_after_first_hunk_are_ignored() {
        let raw = "diff --git a/a.txt b/a.txt\n@@ -1 +1 @@\n-new file mode 100644\n+x\n";
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert_eq!(set.get("a.txt").unwrap().operation, FileOperation::Modified);
    }

    #[test]
    fn chunk_without_destination_is_dropped() {
        let raw = "diff --git a/only-old\nindex 1..2\n";
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn leading_noise_and_empty_input() {
        assert!(parse_unified_diff(b"").unwrap().is_empty());
        let raw = format!("warning: something\n{MODIFIED}");
        let set = parse_unified_diff(raw.as_bytes()).unwrap();
        assert_eq!(
            set.get("chrome/app.cc").unwrap().content.as_deref(),
            Some(MODIFIED.as_bytes())
        );
    }

    #[test]
    fn chunk_without_header_is_a_parse_error() {
        let err = parse_chunk(b"--- a/x\n+++ b/x\n").unwrap_err();
        assert_eq!(err.header, "--- a/x");
    }
}
