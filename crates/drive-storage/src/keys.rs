//! Shared key helpers for storage backends and callers.

/// Join key segments with `/`, dropping empty segments and stray slashes.
pub fn join_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a key into its directory and final segment: `a/b/c.png` -> (`a/b`, `c.png`).
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", key),
    }
}
