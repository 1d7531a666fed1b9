use std::{path::Path, sync::LazyLock};

use regex::Regex;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: 2024-03-09 14:05
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}").unwrap()
});

/// Replace run timestamps and the scratch directory so output can be compared.
pub fn sanitize_report(input: &str, scratch: &Path) -> String {
    let tmp = TIME_RE.replace_all(input, "<time>");
    tmp.replace(scratch.to_string_lossy().as_ref(), "<dir>")
}
