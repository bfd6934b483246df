//! Ordered heterogeneous document value.
//!
//! `Node` is the in-memory tree every YAML/JSON document is parsed into:
//! scalars, insertion-ordered mappings, and sequences. All traversal in
//! this crate (`GetPath`, `AddPath`, `SetPath`, `FindRefs`) dispatches on
//! this single type rather than on `serde_yaml::Value` directly, so the
//! resolver never has to think about non-string mapping keys or YAML tags
//! again once a document has been loaded.

use crate::error::{Error, Result};
use crate::ptr;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// UTF-8 string
    String(String),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// YAML/JSON null
    Null,
}

impl Scalar {
    /// Borrow the inner string if this scalar is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A document value: scalar, ordered mapping, or sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Scalar leaf
    Scalar(Scalar),
    /// Ordered mapping of string keys to child nodes
    Mapping(Mapping),
    /// Ordered sequence of child nodes
    Sequence(Vec<Node>),
}

/// An insertion-ordered mapping with unique string keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping(Vec<(String, Node)>);

impl Mapping {
    /// Build an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate entries mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v as &mut Node))
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a value by key, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Index of the entry with the given key, if any.
    fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k == key)
    }

    /// Append a new `(key, value)` entry. Does not check for duplicates —
    /// callers that must reject duplicates use [`Mapping::append`].
    pub fn push(&mut self, key: impl Into<String>, value: Node) {
        self.0.push((key.into(), value));
    }

    /// Merge `other`'s entries onto the end of `self`, failing if any key in
    /// `other` already exists in `self`.
    pub fn append(&mut self, other: Mapping) -> Result<()> {
        for (key, _) in &other.0 {
            if self.position(key).is_some() {
                return Err(Error::DuplicateKey(key.clone()));
            }
        }
        self.0.extend(other.0);
        Ok(())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Node)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A discovered `$ref` leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// Pointer, inside the host document, at which the `$ref` leaf's
    /// enclosing mapping lives.
    pub path: String,
    /// File component of the `$ref` string (before `#`), `""` if intra-file.
    pub ref_file: String,
    /// Pointer component of the `$ref` string (after `#`), `"/"` if absent.
    pub ref_path: String,
}

impl Node {
    /// Construct an empty mapping node.
    #[must_use]
    pub fn empty_mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    /// Borrow this node as a mapping, if it is one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutably borrow this node as a mapping, if it is one.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow this node as a sequence, if it is one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow this node as a string scalar, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// `GetPath`: read the value at `path`, a JSON Pointer.
    ///
    /// `""` and `"/"` both return the whole document. Returns `None` when
    /// any segment misses rather than erroring.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Node> {
        if path.is_empty() || path == "/" {
            return Some(self);
        }
        let mut cur = self;
        for raw in ptr::split(path) {
            let seg = ptr::unescape(&raw);
            cur = match cur {
                Node::Mapping(m) => m.get(&seg)?,
                Node::Sequence(seq) => {
                    let idx: usize = seg.parse().ok()?;
                    seq.get(idx)?
                }
                Node::Scalar(_) => return None,
            };
        }
        Some(cur)
    }

    /// A thin projection of [`Node::get_path`].
    #[must_use]
    pub fn path_exists(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    /// Convenience accessor used by the `serve` command to read titles out
    /// of the merged document without a second `GetPath`/`as_str` dance.
    #[must_use]
    pub fn get_path_as_str(&self, path: &str) -> Option<&str> {
        self.get_path(path)?.as_str()
    }

    /// `AddPath`: additive merge of `obj` into the tree at `path`.
    pub fn add_path(&mut self, path: &str, obj: Node) -> Result<()> {
        if path.is_empty() || path == "/" {
            let obj_map = obj
                .into_mapping()
                .map_err(|_| Error::PathTypeMismatch("unable to add object".into()))?;
            let m = self
                .as_mapping_mut()
                .ok_or_else(|| Error::PathTypeMismatch("unable to add object".into()))?;
            return m.append(obj_map);
        }

        let segments = ptr::split(path);
        add_path_segments(self, &segments, obj)
    }

    /// `SetPath`: overwriting set with path creation, in place.
    pub fn set_path(&mut self, path: &str, obj: Node) -> Result<()> {
        if path.is_empty() || path == "/" {
            if !matches!(obj, Node::Mapping(_)) {
                return Err(Error::PathTypeMismatch(
                    "root replacement must be a mapping".into(),
                ));
            }
            *self = obj;
            return Ok(());
        }

        let segments = ptr::split(path);
        set_path_segments(self, &segments, obj)
    }

    /// `FindRefs`: depth-first scan for `$ref` string leaves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRef`] if a `$ref` string contains more than
    /// one `#`.
    pub fn find_refs(&self) -> Result<Vec<Ref>> {
        let mut out = Vec::new();
        find_refs_inner(&[], self, &mut out)?;
        Ok(out)
    }

    fn into_mapping(self) -> std::result::Result<Mapping, Node> {
        match self {
            Node::Mapping(m) => Ok(m),
            other => Err(other),
        }
    }
}

fn add_path_segments(node: &mut Node, segments: &[String], obj: Node) -> Result<()> {
    let raw_first = &segments[0];
    let rest = &segments[1..];

    let m = node
        .as_mapping_mut()
        .ok_or_else(|| Error::PathTypeMismatch("unable to add object".into()))?;
    let key = ptr::unescape(raw_first);

    if let Some(idx) = m.position(&key) {
        let (_, existing) = &mut m.0[idx];
        if rest.is_empty() {
            match existing {
                Node::Mapping(existing_map) => {
                    let obj_map = obj
                        .into_mapping()
                        .map_err(|_| Error::PathTypeMismatch("invalid type to add to path".into()))?;
                    return existing_map.append(obj_map);
                }
                Node::Sequence(existing_seq) => {
                    match obj {
                        Node::Sequence(mut obj_seq) => existing_seq.append(&mut obj_seq),
                        other => existing_seq.push(other),
                    }
                    return Ok(());
                }
                _ => return Err(Error::PathTypeMismatch("unable to add object".into())),
            }
        }
        match existing {
            Node::Mapping(_) => add_path_segments(existing, rest, obj),
            _ => Err(Error::PathTypeMismatch("unable to add object".into())),
        }
    } else if rest.is_empty() {
        m.push(key, obj);
        Ok(())
    } else {
        let mut child = Node::empty_mapping();
        add_path_segments(&mut child, rest, obj)?;
        m.push(key, child);
        Ok(())
    }
}

fn set_path_segments(node: &mut Node, segments: &[String], obj: Node) -> Result<()> {
    let raw_first = &segments[0];
    let rest = &segments[1..];
    let last = rest.is_empty();
    let key = ptr::unescape(raw_first);

    match node {
        Node::Mapping(m) => {
            if let Some(idx) = m.position(&key) {
                if last {
                    m.0[idx].1 = obj;
                    Ok(())
                } else {
                    set_path_segments(&mut m.0[idx].1, rest, obj)
                }
            } else if last {
                m.push(key, obj);
                Ok(())
            } else {
                m.push(key, Node::empty_mapping());
                let idx = m.0.len() - 1;
                set_path_segments(&mut m.0[idx].1, rest, obj)
            }
        }
        Node::Sequence(seq) => {
            let idx: usize = key
                .parse()
                .map_err(|_| Error::PathTypeMismatch(format!("not a sequence index: {key}")))?;
            if idx >= seq.len() {
                return Err(Error::PathTypeMismatch(format!(
                    "sequence index out of range: {idx}"
                )));
            }
            if last {
                seq[idx] = obj;
                Ok(())
            } else {
                set_path_segments(&mut seq[idx], rest, obj)
            }
        }
        Node::Scalar(_) => Err(Error::PathTypeMismatch(
            "cannot descend into a scalar".into(),
        )),
    }
}

fn find_refs_inner(path: &[String], node: &Node, out: &mut Vec<Ref>) -> Result<()> {
    match node {
        Node::Mapping(m) => {
            for (key, value) in m.iter() {
                let mut child_path = path.to_vec();
                child_path.push(ptr::escape(key));

                if key == "$ref" {
                    if let Node::Scalar(Scalar::String(v)) = value {
                        let (ref_file, ref_path) = split_ref(v)?;
                        // `path` here is the pointer to the *enclosing*
                        // mapping, not to the $ref leaf itself.
                        out.push(Ref {
                            path: format!("/{}", path.join("/")),
                            ref_file,
                            ref_path,
                        });
                    } else {
                        tracing::warn!(path = %child_path.join("/"), "non-string $ref value ignored");
                    }
                    continue;
                }

                match value {
                    Node::Mapping(_) => find_refs_inner(&child_path, value, out)?,
                    Node::Sequence(seq) => find_refs_on_slice(&child_path, seq, out)?,
                    Node::Scalar(_) => {}
                }
            }
        }
        Node::Sequence(seq) => find_refs_on_slice(path, seq, out)?,
        Node::Scalar(_) => {}
    }
    Ok(())
}

fn find_refs_on_slice(path: &[String], seq: &[Node], out: &mut Vec<Ref>) -> Result<()> {
    for (i, value) in seq.iter().enumerate() {
        let mut child_path = path.to_vec();
        child_path.push(i.to_string());
        match value {
            Node::Mapping(_) => find_refs_inner(&child_path, value, out)?,
            Node::Sequence(inner) => find_refs_on_slice(&child_path, inner, out)?,
            Node::Scalar(_) => {}
        }
    }
    Ok(())
}

/// Split a `$ref` string into its file and pointer components. A `$ref`
/// with more than one `#` is not a valid `[file]#[path]` reference.
fn split_ref(v: &str) -> Result<(String, String)> {
    if v.matches('#').count() > 1 {
        return Err(Error::InvalidRef(v.to_string()));
    }
    Ok(match v.split_once('#') {
        Some((file, path)) => {
            let path = if path.is_empty() { "/".to_string() } else { path.to_string() };
            (file.to_string(), path)
        }
        None => (v.to_string(), "/".to_string()),
    })
}
