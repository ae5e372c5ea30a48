//! Line-based source edits applied to scenario projects.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::PrepError;

/// Split a line into its content and its terminator (`\n`, `\r\n` or empty)
#[inline]
fn split_terminator(segment: &str) -> (&str, &str) {
    let body = match segment.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => segment,
    };
    (body, &segment[body.len()..])
}

/// Insert `statement` as a new line after the first line equal to `line`.
///
/// The comparison is exact apart from the line terminator. The inserted line
/// reuses the terminator of the matched line. If `line` does not occur the
/// file is left untouched and [`PrepError::LineNotFound`] is returned.
pub fn insert_after(path: &Path, line: &str, statement: &str) -> Result<(), PrepError> {
    let content = fs::read_to_string(path)?;
    let updated = insert_after_str(&content, line, statement).ok_or_else(|| {
        PrepError::LineNotFound {
            path: path.to_path_buf(),
            line: line.to_string(),
        }
    })?;

    fs::write(path, updated)?;
    debug!(file = %path.display(), "inserted {statement:?}");
    Ok(())
}

/// In-memory form of [`insert_after`]; `None` when `line` is absent
pub fn insert_after_str(content: &str, line: &str, statement: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len() + statement.len() + 2);
    let mut inserted = false;

    for segment in content.split_inclusive('\n') {
        out.push_str(segment);
        if inserted {
            continue;
        }

        let (body, terminator) = split_terminator(segment);
        if body == line {
            if terminator.is_empty() {
                let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
                out.push_str(newline);
                out.push_str(statement);
            } else {
                out.push_str(statement);
                out.push_str(terminator);
            }
            inserted = true;
        }
    }

    inserted.then_some(out)
}

/// Replace every occurrence of `search` in the file.
/// Returns whether the file changed; unchanged files are not rewritten.
pub fn replace_in_file(path: &Path, search: &str, replacement: &str) -> Result<bool, PrepError> {
    let content = fs::read_to_string(path)?;
    if search.is_empty() || !content.contains(search) {
        return Ok(false);
    }

    fs::write(path, content.replace(search, replacement))?;
    debug!(file = %path.display(), "replaced {search:?} with {replacement:?}");
    Ok(true)
}
