use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::GenerationContext;

/// Separator placed between a template and an appended placeholder.
pub const SEPARATOR: &str = " - ";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z]+)").expect("placeholder pattern"));
static SEP_AT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*").expect("leading separator pattern"));
static SEP_AT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*$").expect("trailing separator pattern"));

/// A placeholder occurrence: byte range of `&Key` and the key as written.
struct Token<'a> {
    range: Range<usize>,
    key: &'a str,
}

/// Placeholders in order of appearance.
///
/// The key is the maximal alphabetic run after `&`; if that run is followed by
/// a digit or underscore there is no word boundary and the text is literal.
fn tokens(template: &str) -> impl Iterator<Item = Token<'_>> {
    PLACEHOLDER.captures_iter(template).filter_map(move |caps| {
        let whole = caps.get(0)?;
        let key = caps.get(1)?;
        let at_boundary = template[whole.end()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        at_boundary.then(|| Token {
            range: whole.range(),
            key: key.as_str(),
        })
    })
}

/// The literal placeholder text for `key` (`&Key`).
pub fn placeholder(key: &str) -> String {
    format!("&{key}")
}

/// Substitute every placeholder that has a value in `context`.
///
/// Placeholders without a value stay verbatim.
pub fn render(template: &str, context: &GenerationContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for token in tokens(template) {
        if let Some(value) = context.get(token.key) {
            out.push_str(&template[last..token.range.start]);
            out.push_str(value);
            last = token.range.end;
        }
    }
    out.push_str(&template[last..]);
    out
}

/// Distinct keys referenced by `template`, in the case they were written.
pub fn active_placeholders(template: &str) -> BTreeSet<String> {
    tokens(template).map(|t| t.key.to_string()).collect()
}

/// Whether `template` references `key` (case-insensitive).
pub fn contains_placeholder(template: &str, key: &str) -> bool {
    tokens(template).any(|t| t.key.eq_ignore_ascii_case(key))
}

/// Append `&key`, joined with [`SEPARATOR`] unless the template is blank.
///
/// Trailing whitespace of the template is dropped before joining.
pub fn insert_placeholder(template: &str, key: &str) -> String {
    let head = template.trim_end();
    if head.is_empty() {
        placeholder(key)
    } else {
        format!("{head}{SEPARATOR}{}", placeholder(key))
    }
}

/// Delete every `&key` occurrence together with one adjacent separator.
///
/// A trailing separator is removed in preference to a leading one. The
/// junction left behind is tidied: doubled separators collapse to one and a
/// separator left dangling at either end is dropped. A template that does not
/// reference `key` is returned unchanged.
pub fn remove_placeholder(template: &str, key: &str) -> String {
    let mut current = template.to_string();
    let mut removed = false;
    loop {
        let found = tokens(&current)
            .find(|t| t.key.eq_ignore_ascii_case(key))
            .map(|t| t.range);
        let Some(range) = found else { break };
        current = cut(&current, range);
        removed = true;
    }
    if removed {
        current.trim().to_string()
    } else {
        current
    }
}

fn cut(template: &str, range: Range<usize>) -> String {
    let mut prefix = &template[..range.start];
    let mut rest = &template[range.end..];
    if let Some(sep) = SEP_AT_START.find(rest) {
        rest = &rest[sep.end()..];
    } else if let Some(sep) = SEP_AT_END.find(prefix) {
        prefix = &prefix[..sep.start()];
    }
    join(prefix, rest)
}

fn join(prefix: &str, rest: &str) -> String {
    if prefix.trim().is_empty() {
        return SEP_AT_START.replace(rest, "").into_owned();
    }
    if rest.trim().is_empty() {
        return SEP_AT_END.replace(prefix, "").into_owned();
    }
    match (SEP_AT_END.find(prefix), SEP_AT_START.find(rest)) {
        (Some(p), Some(r)) => {
            format!("{}{SEPARATOR}{}", &prefix[..p.start()], &rest[r.end()..])
        }
        _ if prefix.ends_with(char::is_whitespace) && rest.starts_with(char::is_whitespace) => {
            format!("{prefix}{}", rest.trim_start())
        }
        _ => format!("{prefix}{rest}"),
    }
}

/// A user-edited name or description template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn render(&self, context: &GenerationContext) -> String {
        render(&self.0, context)
    }

    pub fn active_placeholders(&self) -> BTreeSet<String> {
        active_placeholders(&self.0)
    }

    pub fn references(&self, key: &str) -> bool {
        contains_placeholder(&self.0, key)
    }

    pub fn insert_placeholder(&mut self, key: &str) {
        self.0 = insert_placeholder(&self.0, key);
    }

    pub fn remove_placeholder(&mut self, key: &str) {
        self.0 = remove_placeholder(&self.0, key);
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Template {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Template {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
