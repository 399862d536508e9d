//! Lexical handling of layer entry paths.
//!
//! Tar entry names always use `/` as separator regardless of the host, so
//! these helpers work on strings rather than `std::path::Path`. Nothing here
//! touches the filesystem.

/// Lexically cleans a `/`-separated path.
///
/// Repeated separators collapse, `.` components are dropped and `..`
/// components cancel the preceding component when there is one. A rooted path
/// never climbs above `/`. An empty result becomes `.`.
///
/// # Examples
///
/// ```
/// use layerscan_core::path::clean;
///
/// assert_eq!(clean("etc//apk/./keys/"), "etc/apk/keys");
/// assert_eq!(clean("usr/lib/../bin"), "usr/bin");
/// assert_eq!(clean("/../etc"), "/etc");
/// assert_eq!(clean("../etc"), "../etc");
/// assert_eq!(clean(""), ".");
/// ```
#[must_use]
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Normalizes a raw tar entry name: lexical clean, then strip leading `/`.
///
/// # Examples
///
/// ```
/// use layerscan_core::path::normalize;
///
/// assert_eq!(normalize("/etc/os-release"), "etc/os-release");
/// assert_eq!(normalize("./etc/"), "etc");
/// assert_eq!(normalize("/"), "");
/// ```
#[must_use]
pub fn normalize(name: &str) -> String {
    clean(name).trim_start_matches('/').to_string()
}

/// Splits a path after its last separator.
///
/// The directory part keeps its trailing `/`; either part may be empty.
///
/// # Examples
///
/// ```
/// use layerscan_core::path::split;
///
/// assert_eq!(split("etc/.wh.hostname"), ("etc/", ".wh.hostname"));
/// assert_eq!(split("hostname"), ("", "hostname"));
/// ```
#[must_use]
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}

/// Joins path elements with `/` and cleans the result.
///
/// Empty elements are ignored; if every element is empty the result is empty.
///
/// # Examples
///
/// ```
/// use layerscan_core::path::join;
///
/// assert_eq!(join(&["etc/", "hostname"]), "etc/hostname");
/// assert_eq!(join(&["", "hostname"]), "hostname");
/// assert_eq!(join(&["", ""]), "");
/// ```
#[must_use]
pub fn join(elements: &[&str]) -> String {
    let parts: Vec<&str> = elements.iter().copied().filter(|e| !e.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    clean(&parts.join("/"))
}

/// Computes the path of `target` relative to `base`, lexically.
///
/// Returns `None` when no relative path can be derived: one path is rooted and
/// the other is not, or `base` keeps `..` components that `target` does not
/// share.
///
/// # Examples
///
/// ```
/// use layerscan_core::path::relative;
///
/// assert_eq!(relative("usr/lib", "usr/lib/libc.so").as_deref(), Some("libc.so"));
/// assert_eq!(relative("usr/lib", "usr/bin/sh").as_deref(), Some("../bin/sh"));
/// assert_eq!(relative("usr/lib", "usr/lib").as_deref(), Some("."));
/// assert_eq!(relative("../lib", "usr").as_deref(), None);
/// assert_eq!(relative("/usr", "usr").as_deref(), None);
/// ```
#[must_use]
pub fn relative(base: &str, target: &str) -> Option<String> {
    let base = clean(base);
    let target = clean(target);
    if base == target {
        return Some(".".to_string());
    }
    if base.starts_with('/') != target.starts_with('/') {
        return None;
    }

    let base_parts = components(&base);
    let target_parts = components(&target);
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(b, t)| b == t)
        .count();

    if base_parts[common..].contains(&"..") {
        return None;
    }

    let mut rel: Vec<&str> = vec![".."; base_parts.len() - common];
    rel.extend_from_slice(&target_parts[common..]);
    if rel.is_empty() {
        Some(".".to_string())
    } else {
        Some(rel.join("/"))
    }
}

fn components(cleaned: &str) -> Vec<&str> {
    cleaned
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}
