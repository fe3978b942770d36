//! core::diff
//!
//! Diff synthesis between two full file texts.
//!
//! # Overview
//!
//! [`synthesize`] turns an old and a new text into a list of [`DiffHunk`]s.
//! Line alignment comes from the `similar` crate (Myers); everything after
//! that (run grouping, line numbering, hunk headers) happens here, so the
//! output shape does not depend on libgit2's diff machinery.
//!
//! # Hunk shape
//!
//! - One hunk per maximal run of non-equal lines
//! - No context lines around a hunk
//! - Inside a hunk every deleted line precedes every inserted line
//! - `old_count` is the number of deleted lines, `new_count` the number of
//!   inserted lines
//!
//! # Example
//!
//! ```
//! use gitlane::core::diff::{render, synthesize};
//!
//! let hunks = synthesize("a\nb\nc", "a\nx\nc", "example.txt");
//! assert_eq!(hunks.len(), 1);
//! assert_eq!(render(&hunks), "@@ -2,1 +2,1 @@\n-b\n+x\n");
//! ```

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Returned in place of a diff when neither side decodes to text.
pub const BINARY_OR_EMPTY: &str = "Binary file or empty";

/// How many leading bytes are inspected by [`is_binary`].
const BINARY_SNIFF_LEN: usize = 8192;

/// Kind of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Equal,
    Insert,
    Delete,
}

impl LineKind {
    /// Prefix used in the text serialization.
    pub fn prefix(self) -> char {
        match self {
            LineKind::Equal => ' ',
            LineKind::Insert => '+',
            LineKind::Delete => '-',
        }
    }
}

/// A single line within a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    /// Line text without its trailing newline.
    pub content: String,
    pub kind: LineKind,
    /// 1-based line number in the old text (Equal and Delete lines).
    pub old_line: Option<usize>,
    /// 1-based line number in the new text (Equal and Insert lines).
    pub new_line: Option<usize>,
    /// Whether the source line ended with `\n`.
    pub newline: bool,
}

/// A contiguous block of changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// `@@ -old_start,old_count +new_start,new_count @@`
    pub header: String,
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    fn new(old_start: usize, new_start: usize, deleted: &[&str], inserted: &[&str]) -> Self {
        let old_count = deleted.len();
        let new_count = inserted.len();

        let mut lines = Vec::with_capacity(old_count + new_count);
        for (i, token) in deleted.iter().enumerate() {
            lines.push(DiffLine {
                content: strip_newline(token).to_string(),
                kind: LineKind::Delete,
                old_line: Some(old_start + i),
                new_line: None,
                newline: token.ends_with('\n'),
            });
        }
        for (i, token) in inserted.iter().enumerate() {
            lines.push(DiffLine {
                content: strip_newline(token).to_string(),
                kind: LineKind::Insert,
                old_line: None,
                new_line: Some(new_start + i),
                newline: token.ends_with('\n'),
            });
        }

        Self {
            header: format!("@@ -{old_start},{old_count} +{new_start},{new_count} @@"),
            old_start,
            old_count,
            new_start,
            new_count,
            lines,
        }
    }
}

/// Split text into lines, keeping each line's `\n`.
///
/// A final newline terminates the last line rather than opening an empty one.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn strip_newline(token: &str) -> &str {
    token.strip_suffix('\n').unwrap_or(token)
}

/// A change run that has not been turned into a hunk yet.
struct PendingRun<'a> {
    old_start: usize,
    new_start: usize,
    deleted: Vec<&'a str>,
    inserted: Vec<&'a str>,
}

/// Compute the hunks that turn `old` into `new`.
///
/// `label` names the file for tracing only. Never fails; identical inputs
/// produce an empty list.
pub fn synthesize(old: &str, new: &str, label: &str) -> Vec<DiffHunk> {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let ops = capture_diff_slices(Algorithm::Myers, &old_tokens, &new_tokens);

    let mut hunks = Vec::new();
    let mut old_line = 1;
    let mut new_line = 1;
    let mut pending: Option<PendingRun> = None;

    let mut flush = |pending: &mut Option<PendingRun>, old_line: &mut usize, new_line: &mut usize| {
        if let Some(run) = pending.take() {
            *old_line += run.deleted.len();
            *new_line += run.inserted.len();
            hunks.push(DiffHunk::new(
                run.old_start,
                run.new_start,
                &run.deleted,
                &run.inserted,
            ));
        }
    };

    for op in ops {
        match op {
            DiffOp::Equal { len, .. } => {
                flush(&mut pending, &mut old_line, &mut new_line);
                old_line += len;
                new_line += len;
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                let run = pending.get_or_insert_with(|| PendingRun {
                    old_start: old_line,
                    new_start: new_line,
                    deleted: Vec::new(),
                    inserted: Vec::new(),
                });
                run.deleted
                    .extend_from_slice(&old_tokens[old_index..old_index + old_len]);
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                let run = pending.get_or_insert_with(|| PendingRun {
                    old_start: old_line,
                    new_start: new_line,
                    deleted: Vec::new(),
                    inserted: Vec::new(),
                });
                run.inserted
                    .extend_from_slice(&new_tokens[new_index..new_index + new_len]);
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let run = pending.get_or_insert_with(|| PendingRun {
                    old_start: old_line,
                    new_start: new_line,
                    deleted: Vec::new(),
                    inserted: Vec::new(),
                });
                run.deleted
                    .extend_from_slice(&old_tokens[old_index..old_index + old_len]);
                run.inserted
                    .extend_from_slice(&new_tokens[new_index..new_index + new_len]);
            }
        }
    }
    flush(&mut pending, &mut old_line, &mut new_line);

    tracing::trace!(
        label,
        hunks = hunks.len(),
        old_lines = old_tokens.len(),
        new_lines = new_tokens.len(),
        "synthesized diff"
    );
    hunks
}

/// Serialize hunks to the text form consumed by the GUI.
///
/// Each hunk is its header line followed by one `-` or `+` prefixed line per
/// [`DiffLine`]; every line ends with `\n`.
pub fn render(hunks: &[DiffHunk]) -> String {
    let mut out = String::new();
    for hunk in hunks {
        out.push_str(&hunk.header);
        out.push('\n');
        for line in &hunk.lines {
            out.push(line.kind.prefix());
            out.push_str(&line.content);
            out.push('\n');
        }
    }
    out
}

/// Reapply hunks produced by [`synthesize`] to the old text.
///
/// Returns the text the hunks were computed against as `new`.
pub fn apply(old: &str, hunks: &[DiffHunk]) -> String {
    let old_tokens = tokenize(old);
    let mut out = String::with_capacity(old.len());
    let mut cursor = 0;

    for hunk in hunks {
        let start = (hunk.old_start - 1).min(old_tokens.len());
        for token in &old_tokens[cursor.min(start)..start] {
            out.push_str(token);
        }
        cursor = (start + hunk.old_count).min(old_tokens.len());

        for line in hunk.lines.iter().filter(|l| l.kind == LineKind::Insert) {
            out.push_str(&line.content);
            if line.newline {
                out.push('\n');
            }
        }
    }
    for token in &old_tokens[cursor..] {
        out.push_str(token);
    }
    out
}

/// Returns true if the data looks binary (NUL byte in the first 8 KiB).
pub fn is_binary(data: &[u8]) -> bool {
    let check_len = data.len().min(BINARY_SNIFF_LEN);
    data[..check_len].contains(&0)
}

/// Decode blob or file content as diffable text.
///
/// Binary or non-UTF-8 content decodes to `None`.
pub fn decode_text(data: &[u8]) -> Option<String> {
    if is_binary(data) {
        return None;
    }
    String::from_utf8(data.to_vec()).ok()
}
