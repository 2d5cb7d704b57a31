//! Playground id derivation.
//!
//! `<base>-<UTC instant with ':' and '.' replaced by '-'>`, e.g.
//! `widget-2026-10-19T08-15-02-113Z`. Callers bump with `-2`, `-3`, ... when
//! the id is already taken.

use chrono::{DateTime, Utc};

/// Base name for a clone: last non-empty path segment, `.git` stripped,
/// characters outside `[A-Za-z0-9._-]` replaced by `-`.
pub fn repo_base_name(url: &str) -> String {
    let last = url
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.strip_suffix(".git").unwrap_or(s))
        .filter(|s| !s.is_empty())
        .unwrap_or("repo");
    sanitize(last)
}

/// Base name for a container: `docker-<image with ':' and '/' replaced by '-'>`.
pub fn container_base_name(image: &str) -> String {
    let flattened: String = image
        .chars()
        .map(|c| if c == ':' || c == '/' { '-' } else { c })
        .collect();
    sanitize(&format!("docker-{flattened}"))
}

pub fn timestamp_suffix(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

pub fn timestamped(base: &str, now: DateTime<Utc>) -> String {
    format!("{base}-{}", timestamp_suffix(now))
}

/// First of `candidate`, `candidate-2`, `candidate-3`, ... for which `taken`
/// is false.
pub fn first_free(candidate: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(candidate) {
        return candidate.to_string();
    }
    let mut n = 2u32;
    loop {
        let next = format!("{candidate}-{n}");
        if !taken(&next) {
            return next;
        }
        n += 1;
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
