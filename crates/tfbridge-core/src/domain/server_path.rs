//! Repository ("server") path helpers.
//!
//! Server paths look like `$/Project/src/file.txt`. They always use `/` as the
//! separator and compare case-insensitively, the way the version-control
//! server treats them.

/// The repository root.
pub const SERVER_ROOT: &str = "$/";

/// Returns true when `item_path` names a repository item rather than a local file.
#[must_use]
pub fn is_server_item(item_path: &str) -> bool {
    item_path
        .get(..SERVER_ROOT.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SERVER_ROOT))
}

/// Normalize a server path: unify separators, collapse duplicate slashes and
/// drop any trailing slash (except on the root itself).
#[must_use]
pub fn normalize(server_path: &str) -> String {
    let unified = server_path.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    for part in unified.split('/').filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part);
    }
    if out == "$" {
        out.push('/');
    }
    out
}

/// Split a normalized server path into its segments (`$` is the first).
fn segments(server_path: &str) -> impl Iterator<Item = &str> {
    server_path.split('/').filter(|s| !s.is_empty())
}

/// Whether `ancestor` equals `path` or is a parent of it, by whole segment.
///
/// `$/proj` is an ancestor of `$/proj/sub` but not of `$/project`.
#[must_use]
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    let mut path_segments = segments(path);
    segments(ancestor).all(|a| path_segments.next().is_some_and(|p| p.eq_ignore_ascii_case(a)))
}

/// The segments of `path` below `ancestor`, or `None` if it is not an ancestor.
#[must_use]
pub fn relative_segments<'a>(ancestor: &str, path: &'a str) -> Option<Vec<&'a str>> {
    if !is_ancestor(ancestor, path) {
        return None;
    }
    let depth = segments(ancestor).count();
    Some(segments(path).skip(depth).collect())
}

/// Append segments to a server path.
#[must_use]
pub fn join<'a>(base: &str, rest: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = normalize(base);
    for segment in rest {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}
