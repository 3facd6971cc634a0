//! Text cleanup applied to content crossing the remote boundary

use std::sync::LazyLock;

use regex::Regex;

static MARKDOWN_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([#*_\-+.`\[\]()>])").unwrap());

/// Remove markdown backslash escapes (`\#`, `\*`, `\_`, ...).
///
/// Remote editors export markdown with these escapes; removing them keeps
/// round-tripped text identical to what was written locally.
pub fn strip_markdown_escapes(text: &str) -> String {
    MARKDOWN_ESCAPE.replace_all(text, "$1").into_owned()
}

/// Apply cleanup when enabled, otherwise return the text unchanged.
pub fn prepare(text: &str, clean: bool) -> String {
    if clean {
        strip_markdown_escapes(text)
    } else {
        text.to_string()
    }
}
