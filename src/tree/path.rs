//! Path key scheme
//!
//! Store keys are node paths with empty segments dropped, so `/a//b/` and
//! `a/b` address the same key. The root normalizes to the empty string and is
//! never stored. Because sled keeps keys in byte order, every
//! descendant of `d` lives in the contiguous range starting at `d/`.

/// Path separator
pub const SEPARATOR: char = '/';

/// Normalize a caller-supplied path to its key form.
pub fn normalize(path: &str) -> String {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Prefix shared by every key below `dir`. Empty for the root.
pub fn child_prefix(dir: &str) -> String {
    let key = normalize(dir);
    if key.is_empty() {
        key
    } else {
        format!("{}{}", key, SEPARATOR)
    }
}

/// True when `key`, found under `prefix`, is a direct child rather than a
/// deeper descendant.
pub fn is_immediate_child(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .map(|rest| !rest.contains(SEPARATOR))
        .unwrap_or(false)
}

/// Every ancestor key of `key`, shallowest first. `a/b/c` yields `a`, `a/b`.
pub fn ancestors(key: &str) -> Vec<String> {
    let key = normalize(key);
    key.match_indices(SEPARATOR)
        .map(|(idx, _)| key[..idx].to_string())
        .collect()
}

/// True when `key` is `base` itself or lies below it.
pub fn is_within(key: &str, base: &str) -> bool {
    if base.is_empty() {
        return true;
    }
    key == base
        || key
            .strip_prefix(base)
            .map(|rest| rest.starts_with(SEPARATOR))
            .unwrap_or(false)
}

/// Swap the `from` prefix of `key` for `to`. Both must be normalized keys and
/// `key` must be within `from`.
pub fn rebase(key: &str, from: &str, to: &str) -> String {
    let rest = key.strip_prefix(from).unwrap_or(key);
    let rest = rest.trim_start_matches(SEPARATOR);
    match (to.is_empty(), rest.is_empty()) {
        (_, true) => to.to_string(),
        (true, false) => rest.to_string(),
        (false, false) => format!("{}{}{}", to, SEPARATOR, rest),
    }
}
