//! JSON Pointer (RFC 6901) helpers for data-model paths.
//!
//! Two readings of a path coexist. [`is_valid`] is the strict grammar used by
//! the validator, where a relative `"a/b"` is malformed. [`tokens`] is the lenient
//! reading used while processing, which skips empty segments so that `"/a/"`
//! and `"/a"` address the same location.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::ProtocolError;

/// Grammar: zero or more `/`-prefixed tokens, `~` only as `~0` or `~1`.
pub const POINTER_PATTERN: &str = r"^(?:/(?:[^~/]|~[01])*)*$";

/// Path addressing the whole data model.
pub const ROOT: &str = "/";

static POINTER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(POINTER_PATTERN).ok());

/// Check `path` against the JSON Pointer grammar.
///
/// ```
/// use a2ui_protocol::pointer;
///
/// assert!(pointer::is_valid(""));
/// assert!(pointer::is_valid("/a/b"));
/// assert!(!pointer::is_valid("/invalid/escape/~2"));
/// ```
#[must_use]
pub fn is_valid(path: &str) -> bool {
    POINTER_RE.as_ref().is_some_and(|re| re.is_match(path))
}

/// Split a path into unescaped reference tokens, skipping empty segments.
pub fn tokens(path: &str) -> Result<Vec<String>, ProtocolError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| unescape(segment, path))
        .collect()
}

fn unescape(segment: &str, path: &str) -> Result<String, ProtocolError> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }

    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(ProtocolError::InvalidPointer {
                    path: path.to_string(),
                })
            }
        }
    }
    Ok(out)
}

/// Escape a single reference token (`~` → `~0`, `/` → `~1`).
#[must_use]
pub fn escape(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Append one (unescaped) token to `base`.
#[must_use]
pub fn child(base: &str, token: &str) -> String {
    let token = escape(token);
    if base.ends_with('/') {
        format!("{base}{token}")
    } else {
        format!("{base}/{token}")
    }
}

/// Resolve `path` against a data context.
///
/// Absolute paths win over the context. `"."` and `""` address the context
/// itself; anything else is appended to it.
#[must_use]
pub fn resolve(path: &str, context: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }

    let context = if context.is_empty() { ROOT } else { context };
    let relative = path.strip_prefix("./").unwrap_or(path);
    if relative.is_empty() || relative == "." {
        return context.to_string();
    }

    if context == ROOT {
        format!("/{relative}")
    } else {
        format!("{}/{relative}", context.trim_end_matches('/'))
    }
}
