//! Append-only registry of loaded documents, keyed by resolved filename.
//!
//! A file is read and parsed exactly once no matter how many other
//! documents reference it, and its `$ref` leaves are pre-scanned at load
//! time so the resolver never re-walks a document it has already indexed.
//! Index 0 — the root document opened by [`Cache::open`] — is the only
//! entry the resolver ever mutates; every other entry stays a read-only
//! source of subtrees to splice into the root. Each entry's ref list is
//! sorted by pointer path right after scanning, so resolution order is
//! independent of the order `$ref` leaves happened to appear in the file.
//!
//! `open` eagerly loads the full reference closure (`LoadRefs` in
//! spec.md/the Go original) before resolution ever starts: every file
//! transitively reachable through a `$ref`'s file component is read and
//! parsed here, not only the ones a particular resolved subtree happens to
//! walk through. This is what makes a missing or unreadable referenced file
//! anywhere in the closure a fatal `Open`-time error, even when the `$ref`
//! that names it would otherwise be skipped by the resolver's subtree
//! filter.

use std::collections::HashMap;

use crate::error::Result;
use crate::node::{Node, Ref};
use crate::ptr;
use crate::yaml;

/// One cached document: its resolved filename, parsed tree, and
/// pre-scanned `$ref` leaves.
pub struct CacheEntry {
    /// Filename this entry was loaded from.
    pub filename: String,
    /// Parsed document tree.
    pub doc: Node,
    /// `$ref` leaves found in `doc` at load time.
    pub refs: Vec<Ref>,
}

/// Document cache: an ordered, keyed registry. Mirrors the Go original's
/// hand-rolled `Map[T, U]` (`data []T` + `hash map[U]int`) — an append-only
/// vector for order-preserving iteration plus a hash index for O(1)
/// `contains`/`get`, rather than a linear scan over `entries`.
#[derive(Default)]
pub struct Cache {
    entries: Vec<CacheEntry>,
    index: HashMap<String, usize>,
}

impl Cache {
    /// Build an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load `filename` as the root document, seeding the cache at index 0,
    /// then eagerly load every file transitively reachable from it through
    /// a `$ref` (`LoadRefs`). A missing or unparsable file anywhere in that
    /// closure fails here, before resolution begins.
    pub fn open(&mut self, filename: &str) -> Result<()> {
        self.load(filename)?;
        self.load_refs_transitively()
    }

    /// Walk every currently-cached file's pre-scanned ref list, resolving
    /// each external (non-intra-file) reference's file component and
    /// loading it if it isn't cached yet. Newly loaded files are
    /// themselves scanned in the same pass, so this reaches the full
    /// transitive closure, not just one level of references.
    fn load_refs_transitively(&mut self) -> Result<()> {
        let mut i = 0;
        while i < self.entries.len() {
            let host_file = self.entries[i].filename.clone();
            let refs = self.entries[i].refs.clone();
            for r in &refs {
                if r.ref_file.is_empty() {
                    continue;
                }
                let full_file = ptr::resolve_file(&host_file, &r.ref_file);
                if !self.contains(&full_file) {
                    self.load(&full_file)?;
                }
            }
            i += 1;
        }
        Ok(())
    }

    /// The root document, mutably.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.entries[0].doc
    }

    /// The root document.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.entries[0].doc
    }

    /// The filename the root document was opened from.
    #[must_use]
    pub fn root_filename(&self) -> &str {
        &self.entries[0].filename
    }

    /// Whether `filename` has already been loaded.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.index.contains_key(filename)
    }

    /// Look up an already-loaded entry.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&CacheEntry> {
        self.index.get(filename).map(|&i| &self.entries[i])
    }

    /// Load `filename` if it isn't cached yet, then return its entry.
    /// Loading never happens twice for the same filename.
    pub fn load(&mut self, filename: &str) -> Result<&CacheEntry> {
        if !self.contains(filename) {
            tracing::debug!(filename, "loading referenced document");
            let doc = yaml::load_file(filename)?;
            let mut refs = doc.find_refs()?;
            refs.sort_by(|a, b| a.path.cmp(&b.path));
            let idx = self.entries.len();
            self.entries.push(CacheEntry {
                filename: filename.to_string(),
                doc,
                refs,
            });
            self.index.insert(filename.to_string(), idx);
        }
        Ok(self
            .get(filename)
            .expect("just inserted above, or already present"))
    }

    /// Number of documents currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no documents yet (i.e. [`Cache::open`] has not
    /// been called).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
