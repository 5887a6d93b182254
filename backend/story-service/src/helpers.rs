//! Text helpers used by the story views.
//!
//! `truncate` shortens story bodies for listing cards without cutting a word
//! in half; `strip_tags` removes markup so the preview is plain text. Both are
//! exposed to templates as Tera filters through [`register_filters`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tera::{Tera, Value};

const ELLIPSIS: &str = "...";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // `(?s)` lets `.` cross newlines, so multi-line tags are removed too.
    Regex::new(r"(?s)<.*?>").expect("tag pattern is a valid regex")
});

/// Shorten `text` to at most `max_len` characters plus an ellipsis.
///
/// The cut is moved back to the last space inside the first `max_len`
/// characters. When that prefix has no usable space the raw cut is kept.
/// Text that already fits is returned unchanged.
pub fn truncate(text: &str, max_len: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_len || char_count == 0 {
        return text.to_string();
    }

    let raw_cut: String = text.chars().take(max_len).collect();
    let word_cut = match raw_cut.rfind(' ') {
        Some(idx) => &raw_cut[..idx],
        None => "",
    };

    let kept = if word_cut.is_empty() {
        raw_cut.as_str()
    } else {
        word_cut
    };

    format!("{kept}{ELLIPSIS}")
}

/// Remove every `<...>` span (non-greedy, across newlines) from `text`.
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

fn truncate_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("truncate_words filter requires a string"))?;
    let len = args
        .get("len")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("truncate_words filter requires a `len` argument"))?;

    Ok(Value::String(truncate(text, len as usize)))
}

fn strip_tags_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("strip_tags filter requires a string"))?;

    Ok(Value::String(strip_tags(text)))
}

/// Register the helpers as `truncate_words(len=N)` and `strip_tags`.
pub fn register_filters(tera: &mut Tera) {
    tera.register_filter("truncate_words", truncate_filter);
    tera.register_filter("strip_tags", strip_tags_filter);
}
