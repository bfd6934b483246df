//! RFC 6901 JSON Pointer algebra.
//!
//! Pointers are kept as plain `str`/`String` throughout this crate — the
//! resolver only ever needs to split, join, escape, and rebase them, never
//! to hold a parsed pointer across an await point or a mutation, so a typed
//! token list would just be overhead.

/// Escape a single path segment per RFC 6901: `~` -> `~0`, `/` -> `~1`.
///
/// Order matters on the way back out (see [`unescape`]) but not here, since
/// `~` never appears in the output of the `/` replacement.
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Undo [`escape`]. `~1` must be unescaped before `~0`, otherwise a segment
/// like `a~01` (escaped `a~1`) would incorrectly decode to `a/`.
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Split a JSON Pointer into its raw (still-escaped) segments.
///
/// `""` and `"/"` both split to an empty segment list, denoting the
/// document root — callers must special-case root themselves when a
/// literal `""` key (as opposed to "no segments") would be ambiguous.
pub fn split(path: &str) -> Vec<String> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(str::to_string).collect()
}

/// Join already-escaped segments back into a pointer string.
pub fn join(segments: &[String]) -> String {
    if segments.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for seg in segments {
        out.push('/');
        out.push_str(seg);
    }
    out
}

/// The last segment of a pointer, still escaped, or `""` if the pointer is
/// root/empty.
pub fn last_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Rebase a pointer discovered at `addition` (relative to `sub`, inside the
/// document currently mounted at `sub`) onto `base`, the place that document
/// is being relocated to.
///
/// Returns `""` if `addition` does not fall under `sub` (the caller treats
/// that as "not our concern, skip").
pub fn combine_path(base: &str, addition: &str, sub: &str) -> String {
    if !addition.starts_with(sub) {
        return String::new();
    }
    let rest = &addition[sub.len()..];
    let rest = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    };
    let rest = rest.strip_suffix("/$ref").unwrap_or(&rest);
    let base = if base == "/" { "" } else { base };
    format!("{base}{rest}")
}

/// POSIX-style relative-file resolution: resolve `other_file` (itself
/// possibly relative) against the directory containing `host_file`.
///
/// Normalizes `..` segments by popping from the host directory, so the same
/// file reached via different relative paths resolves to the same string
/// and therefore cache-hits. Mirrors Go's `path.Dir`/`path.Base`, which
/// lexically clean their input first — a bare "./x" host file therefore
/// dirs to "." rather than "./", which is what keeps the degenerate
/// same-directory case below producing a (harmless) doubled "./" prefix.
pub fn resolve_file(host_file: &str, other_file: &str) -> String {
    let mut dir1: Vec<String> = dirname(host_file)
        .split('/')
        .map(str::to_string)
        .collect();

    let mut dir2: Vec<String> = dirname(other_file)
        .split('/')
        .map(str::to_string)
        .collect();

    // Strip only *leading* "." segments, same as the original's single pass
    // over the original length of dir2.
    let original_len = dir2.len();
    for _ in 0..original_len {
        if dir2.first().map(String::as_str) == Some(".") {
            dir2.remove(0);
        }
    }

    let mut i = 0;
    while i < dir2.len() && dir2[i] == ".." {
        if dir1.is_empty() {
            break;
        }
        dir1.pop();
        i += 1;
    }

    let mut joined = dir1;
    joined.extend(dir2[i..].iter().cloned());
    format!("./{}/{}", joined.join("/"), basename(other_file))
}

/// Lexically clean a POSIX path the way Go's `path.Clean` does: drop `.`
/// segments and empty segments, and resolve `..` against a preceding
/// non-`..` segment.
fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => continue,
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else if !rooted {
                    out.push("..");
                }
            }
            s => out.push(s),
        }
    }
    let joined = out.join("/");
    match (rooted, joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn dirname(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => cleaned[..idx].to_string(),
        None => ".".to_string(),
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_unescape_roundtrip() {
        for s in ["plain", "a/b", "a~b", "a~/b~0~1", ""] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }

    #[test]
    fn escape_order() {
        assert_eq!(escape("~1"), "~01");
        assert_eq!(escape("a/b~c"), "a~1b~0c");
    }

    #[test]
    fn split_root_forms() {
        assert!(split("").is_empty());
        assert!(split("/").is_empty());
        assert_eq!(split("/a/b"), vec!["a", "b"]);
    }

    #[test]
    fn last_path_segment() {
        assert_eq!(last_path("/paths/~1hello/get"), "get");
        assert_eq!(last_path(""), "");
    }

    #[test]
    fn combine_path_scenarios() {
        assert_eq!(
            combine_path("/", "/paths/~1hello/$ref", "/"),
            "/paths/~1hello"
        );
        assert_eq!(
            combine_path(
                "/paths/~1hello",
                "/paths/~1hello/get/responses/200/content/application~1json/schema/properties/name/$ref",
                "/paths/~1hello"
            ),
            "/paths/~1hello/get/responses/200/content/application~1json/schema/properties/name"
        );
        assert_eq!(combine_path("/paths/~1hello", "/get/$ref", "/"), "/paths/~1hello/get");
    }

    #[test]
    fn combine_path_skip_when_outside_sub() {
        assert_eq!(combine_path("/a", "/b/$ref", "/components"), "");
    }

    #[test]
    fn resolve_file_same_dir() {
        assert_eq!(resolve_file("./api.yaml", "./paths.yaml"), "././paths.yaml");
    }

    #[test]
    fn resolve_file_nested_dir() {
        assert_eq!(
            resolve_file("./specs/api.yaml", "./schemas/hello.yaml"),
            "./specs/schemas/hello.yaml"
        );
    }

    #[test]
    fn resolve_file_parent_dir() {
        assert_eq!(
            resolve_file("./specs/nested/api.yaml", "../common.yaml"),
            "./specs/common.yaml"
        );
    }
}
