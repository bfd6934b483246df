//! Cross-file `$ref` resolver.
//!
//! Walks the reference graph reachable from the root document. For every
//! `$ref` found, in whichever file it happens to live:
//!
//! - resolves the file component against the file it was found in and loads
//!   it into the cache (once);
//! - computes the pointer the reference lives at *after* its enclosing
//!   subtree is relocated (`newpath`, via [`ptr::combine_path`]);
//! - classifies `newpath` against the fixed set of OpenAPI component
//!   buckets (`schema(s)`, `responses`, `parameters`, ...) to decide
//!   whether the referenced content belongs in `/components/<bucket>`, is
//!   an inlined example, or should simply be inlined in place;
//! - places the content accordingly, rewrites the original `$ref` string,
//!   and queues that content's own `$ref` leaves — rebased onto their new
//!   home — for the same treatment.
//!
//! A `$ref` that stays inside the root document never leaves it — it is
//! rewritten to its own `#/...` form in place and nothing is copied.
//!
//! Per-ref state: Discovered (popped from a file's ref list) -> Classified
//! (inline-example / component-bucket / inline-fallback chosen from
//! `newpath`) -> Placed (subtree copied into root, for the first sighting
//! of a given source) -> Rewritten (`$ref` string updated) -> Descended
//! (its own refs queued, rebased). A bucket reference whose source
//! (file, pointer) was already placed by an earlier ref skips straight to
//! Rewritten, reusing the existing alias — the alias is recorded before
//! its subtree's own refs are queued, so a ref that loops back to the same
//! source finds the alias already assigned and terminates there. Inline
//! placements (which are never aliased) are guarded against true pointer
//! cycles by an ancestor stack instead: repeated-but-acyclic inlining of
//! the same source is legitimate and gets its own independent rewrite.

use std::collections::{HashMap, HashSet};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::node::{Node, Ref, Scalar};
use crate::ptr;

/// OpenAPI component buckets recognized when classifying a mount point.
/// `"schema"` (singular) is a special case mapping to the plural
/// `schemas` bucket; every other match maps to `/components/<match>`.
const BUCKET_KEYWORDS: &[&str] = &[
    "schemas",
    "responses",
    "parameters",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Resolve every reachable `$ref` in `cache`'s root document, splicing
/// external subtrees under `/components` (or inlining them) as it goes.
pub fn resolve(cache: &mut Cache) -> Result<()> {
    let mut state = ResolverState::default();
    let root_filename = cache.root_filename().to_string();
    resolve_subtree(cache, &mut state, &root_filename, "/", &root_filename, "/")
}

/// Per-run bookkeeping: which bucket/name pairs are taken, which source
/// (file + pointer) has already been assigned which name, and which
/// sources are currently being descended into (to break pointer cycles in
/// inline placements, which have no alias to dedupe on).
#[derive(Default)]
struct ResolverState {
    used_names: HashMap<String, HashSet<String>>,
    alias_for: HashMap<String, String>,
    in_progress: HashSet<String>,
    /// Reserved for a `UNNAMED<n>` fallback naming scheme considered and
    /// rejected in favor of the per-bucket `used_names` scheme below — kept
    /// as a documented, unused field rather than removed outright.
    #[allow(dead_code)]
    unnamed_counter: usize,
}

impl ResolverState {
    /// Choose a name for `candidate` unique (case-insensitively) within
    /// `bucket`, suffixing `2, 3, ...` after stripping trailing digits on
    /// collision.
    fn unique_name(&mut self, bucket: &str, candidate: &str) -> String {
        let used = self.used_names.entry(bucket.to_string()).or_default();
        let lower = candidate.to_lowercase();
        if used.insert(lower) {
            return candidate.to_string();
        }
        let stripped = candidate.trim_end_matches(|c: char| c.is_ascii_digit());
        let stripped = if stripped.is_empty() { candidate } else { stripped };
        let mut n = 2usize;
        loop {
            let attempt = format!("{stripped}{n}");
            if used.insert(attempt.to_lowercase()) {
                return attempt;
            }
            n += 1;
        }
    }
}

/// Process every `$ref` in `target_file`'s pre-scanned ref list whose
/// origin pointer falls under `target_base_path` (the subtree currently
/// being mounted), rebasing each onto `base_path` in the root document.
fn resolve_subtree(
    cache: &mut Cache,
    state: &mut ResolverState,
    root_filename: &str,
    base_path: &str,
    target_file: &str,
    target_base_path: &str,
) -> Result<()> {
    let refs: Vec<Ref> = cache
        .get(target_file)
        .expect("target file must already be cached before its subtree is resolved")
        .refs
        .clone();

    let trimmed = target_base_path.trim_end_matches('/');
    let prefix = format!("{trimmed}/");

    for r in &refs {
        let rtrimmed = r.path.trim_end_matches('/');
        let rprefix = format!("{rtrimmed}/");
        if !rprefix.starts_with(&prefix) {
            continue;
        }
        process_ref(cache, state, root_filename, base_path, target_file, target_base_path, r)?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_ref(
    cache: &mut Cache,
    state: &mut ResolverState,
    root_filename: &str,
    base_path: &str,
    target_file: &str,
    target_base_path: &str,
    r: &Ref,
) -> Result<()> {
    let newpath = ptr::combine_path(base_path, &r.path, target_base_path);
    if newpath.is_empty() {
        return Ok(());
    }

    let ref_full_file = if r.ref_file.is_empty() {
        target_file.to_string()
    } else {
        ptr::resolve_file(target_file, &r.ref_file)
    };

    if ref_full_file == root_filename {
        cache.root_mut().set_path(
            &format!("{newpath}/$ref"),
            Node::Scalar(Scalar::String(format!("#{}", r.ref_path))),
        )?;
        return Ok(());
    }

    cache.load(&ref_full_file)?;

    let component_path = classify_component_path(&newpath);
    let last = ptr::last_path(&newpath);

    if component_path == "/components/examples" && last == "examples" {
        let obj = fetch(cache, &ref_full_file, &r.ref_path)?;
        cache.root_mut().set_path(&newpath, obj)?;
        descend(cache, state, root_filename, &newpath, &ref_full_file, &r.ref_path)?;
        return Ok(());
    }

    let under_bucket = !component_path.is_empty()
        && (newpath.starts_with("/paths/")
            || newpath.starts_with("/components/")
            || newpath.starts_with(&format!("{component_path}/")));

    if under_bucket {
        let source_key = format!("{ref_full_file}#{}", r.ref_path);
        let (alias, first_time) = match state.alias_for.get(&source_key) {
            Some(existing) => (existing.clone(), false),
            None => {
                let candidate = candidate_name(&r.ref_path, &r.ref_file);
                let name = state.unique_name(&component_path, &candidate);
                state.alias_for.insert(source_key, name.clone());
                (name, true)
            }
        };
        let target_path = format!("{component_path}/{alias}");
        cache.root_mut().set_path(
            &format!("{newpath}/$ref"),
            Node::Scalar(Scalar::String(format!("#{target_path}"))),
        )?;
        if first_time {
            let obj = fetch(cache, &ref_full_file, &r.ref_path)?;
            cache.root_mut().set_path(&target_path, obj)?;
            descend(cache, state, root_filename, &target_path, &ref_full_file, &r.ref_path)?;
        }
        return Ok(());
    }

    let obj = fetch(cache, &ref_full_file, &r.ref_path)?;
    cache.root_mut().set_path(&newpath, obj)?;
    descend(cache, state, root_filename, &newpath, &ref_full_file, &r.ref_path)?;
    Ok(())
}

/// Recurse into a just-placed subtree, guarding against a pointer-level
/// cycle (the same `(file, pointer)` already on the active descent stack)
/// rather than just relying on alias dedup — inline placements have no
/// alias to short-circuit on.
fn descend(
    cache: &mut Cache,
    state: &mut ResolverState,
    root_filename: &str,
    base_path: &str,
    target_file: &str,
    target_base_path: &str,
) -> Result<()> {
    let marker = format!("{target_file}#{target_base_path}");
    if !state.in_progress.insert(marker.clone()) {
        return Ok(());
    }
    let result = resolve_subtree(cache, state, root_filename, base_path, target_file, target_base_path);
    state.in_progress.remove(&marker);
    result
}

fn fetch(cache: &Cache, file: &str, path: &str) -> Result<Node> {
    cache
        .get(file)
        .expect("just loaded")
        .doc
        .get_path(path)
        .cloned()
        .ok_or_else(|| Error::UnresolvedRef {
            file: file.to_string(),
            pointer: path.to_string(),
        })
}

/// Classify a destination pointer against the fixed OpenAPI component
/// buckets by scanning its segments in reverse for the first match.
/// `"schema"` (singular) maps to the plural `/components/schemas`; any
/// other recognized keyword `X` maps to `/components/X`. No match yields
/// an empty string.
fn classify_component_path(newpath: &str) -> String {
    for seg in ptr::split(newpath).iter().rev() {
        let key = ptr::unescape(seg);
        if key == "schema" {
            return "/components/schemas".to_string();
        }
        if BUCKET_KEYWORDS.contains(&key.as_str()) {
            return format!("/components/{key}");
        }
    }
    String::new()
}

/// Candidate component name: the last segment of the reference's own
/// pointer, or the *declared* (unresolved) ref file's stem when the
/// reference points at a whole file (`ref_path == "/"`).
fn candidate_name(ref_path: &str, ref_file: &str) -> String {
    let last = ptr::last_path(ref_path);
    if last.is_empty() {
        file_stem(ref_file)
    } else {
        ptr::unescape(last)
    }
}

fn file_stem(filename: &str) -> String {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    base.split('.').next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_tempdir_cwd(files: &[(&str, &str)]) -> (tempfile::TempDir, CwdGuard) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, contents).unwrap();
        }
        let guard = CwdGuard(std::env::current_dir().unwrap());
        std::env::set_current_dir(dir.path()).unwrap();
        (dir, guard)
    }

    #[test]
    fn path_item_refs_are_inlined_not_bucketed() {
        let (_dir, _guard) = with_tempdir_cwd(&[
            (
                "api.yaml",
                "openapi: 3.0.0\ninfo:\n  title: demo\npaths:\n  /hello:\n    $ref: ./paths.yaml#/get\n",
            ),
            (
                "paths.yaml",
                concat!(
                    "get:\n",
                    "  summary: says hello\n",
                    "  responses:\n",
                    "    200:\n",
                    "      description: ok\n",
                    "      content:\n",
                    "        application/json:\n",
                    "          schema:\n",
                    "            $ref: ./schemas.yaml#/components/schemas/Greeting\n",
                ),
            ),
            (
                "schemas.yaml",
                concat!(
                    "components:\n",
                    "  schemas:\n",
                    "    Greeting:\n",
                    "      type: object\n",
                    "      properties:\n",
                    "        message:\n",
                    "          type: string\n",
                ),
            ),
        ]);

        let mut cache = Cache::new();
        cache.open("./api.yaml").unwrap();
        resolve(&mut cache).unwrap();

        let root = cache.root();
        // The path item itself is inlined directly at /paths/~1hello: no
        // alias, no /components/schemas/hello entry.
        assert!(!root.path_exists("/paths/~1hello/$ref"));
        assert_eq!(
            root.get_path_as_str("/paths/~1hello/summary"),
            Some("says hello")
        );
        // The nested schema $ref, whose destination lands under a
        // recognized bucket keyword, does get relocated.
        assert_eq!(
            root.get_path_as_str(
                "/paths/~1hello/responses/200/content/application~1json/schema/$ref"
            ),
            Some("#/components/schemas/Greeting")
        );
        assert_eq!(
            root.get_path_as_str("/components/schemas/Greeting/type"),
            Some("object")
        );
        assert!(root.path_exists("/components/schemas/Greeting/properties/message"));
        assert!(!root.path_exists("/components/schemas/hello"));
    }

    #[test]
    fn repeated_reference_reuses_the_same_alias() {
        let (_dir, _guard) = with_tempdir_cwd(&[
            (
                "api.yaml",
                concat!(
                    "components:\n",
                    "  schemas:\n",
                    "    A:\n",
                    "      $ref: ./common.yaml#/components/schemas/Pet\n",
                    "    B:\n",
                    "      $ref: ./common.yaml#/components/schemas/Pet\n",
                ),
            ),
            (
                "common.yaml",
                "components:\n  schemas:\n    Pet:\n      type: object\n",
            ),
        ]);

        let mut cache = Cache::new();
        cache.open("./api.yaml").unwrap();
        resolve(&mut cache).unwrap();

        let root = cache.root();
        let a = root.get_path_as_str("/components/schemas/A/$ref").unwrap();
        let b = root.get_path_as_str("/components/schemas/B/$ref").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "#/components/schemas/Pet");

        let schemas = root.get_path("/components/schemas").unwrap().as_mapping().unwrap();
        // A, B, and the single placed Pet — the same source must not be
        // placed twice.
        assert_eq!(schemas.len(), 3, "the same source must not be placed twice");
    }

    #[test]
    fn name_collision_gets_a_numeric_suffix() {
        let (_dir, _guard) = with_tempdir_cwd(&[
            (
                "api.yaml",
                concat!(
                    "components:\n",
                    "  schemas:\n",
                    "    A:\n",
                    "      $ref: ./one.yaml#/components/schemas/Pet\n",
                    "    B:\n",
                    "      $ref: ./two.yaml#/components/schemas/Pet\n",
                ),
            ),
            (
                "one.yaml",
                "components:\n  schemas:\n    Pet:\n      type: object\n      title: one\n",
            ),
            (
                "two.yaml",
                "components:\n  schemas:\n    Pet:\n      type: object\n      title: two\n",
            ),
        ]);

        let mut cache = Cache::new();
        cache.open("./api.yaml").unwrap();
        resolve(&mut cache).unwrap();

        let root = cache.root();
        let a = root.get_path_as_str("/components/schemas/A/$ref").unwrap();
        let b = root.get_path_as_str("/components/schemas/B/$ref").unwrap();
        assert_ne!(a, b);
        assert!(root.path_exists("/components/schemas/Pet"));
        assert!(root.path_exists("/components/schemas/Pet2"));
    }

    #[test]
    fn classify_component_path_scans_destination_not_source() {
        assert_eq!(
            classify_component_path("/components/parameters/Limit"),
            "/components/parameters"
        );
        assert_eq!(classify_component_path("/paths/~1pets"), "");
        assert_eq!(
            classify_component_path("/paths/~1pets/get/responses/200/schema"),
            "/components/schemas"
        );
    }

    #[test]
    fn examples_bucket_reference_is_inlined_not_aliased() {
        let (_dir, _guard) = with_tempdir_cwd(&[
            (
                "api.yaml",
                concat!(
                    "paths:\n",
                    "  /pets:\n",
                    "    get:\n",
                    "      responses:\n",
                    "        200:\n",
                    "          content:\n",
                    "            application/json:\n",
                    "              examples:\n",
                    "                $ref: ./examples.yaml#/petExamples\n",
                ),
            ),
            (
                "examples.yaml",
                concat!(
                    "petExamples:\n",
                    "  cat:\n",
                    "    value:\n",
                    "      name: Tom\n",
                ),
            ),
        ]);

        let mut cache = Cache::new();
        cache.open("./api.yaml").unwrap();
        resolve(&mut cache).unwrap();

        let root = cache.root();
        let mount = "/paths/~1pets/get/responses/200/content/application~1json/examples";
        // Inlined directly at the mount point: no $ref left there, and no
        // alias placed under /components/examples.
        assert!(!root.path_exists(&format!("{mount}/$ref")));
        assert_eq!(
            root.get_path_as_str(&format!("{mount}/cat/value/name")),
            Some("Tom")
        );
        assert!(!root.path_exists("/components/examples/petExamples"));
    }

    #[test]
    fn intra_root_ref_is_rewritten_without_copying_content() {
        let (_dir, _guard) = with_tempdir_cwd(&[(
            "api.yaml",
            concat!(
                "components:\n",
                "  schemas:\n",
                "    Pet:\n",
                "      type: object\n",
                "paths:\n",
                "  /pets:\n",
                "    get:\n",
                "      responses:\n",
                "        200:\n",
                "          schema:\n",
                "            $ref: \"#/components/schemas/Pet\"\n",
            ),
        )]);

        let mut cache = Cache::new();
        cache.open("./api.yaml").unwrap();
        resolve(&mut cache).unwrap();

        let root = cache.root();
        assert_eq!(
            root.get_path_as_str("/paths/~1pets/get/responses/200/schema/$ref"),
            Some("#/components/schemas/Pet")
        );
    }
}
