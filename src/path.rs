use std::fmt::{Display, Formatter, Result};

/// ltree label separator.
pub const SEPARATOR: char = '.';

/// Position of a content item in the reply tree.
///
/// The path is self-inclusive: the keys of every ancestor, root first,
/// followed by the item's own key. A top-level post has a single segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterializedPath(String);

impl MaterializedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path of a new reply to the item at `self`.
    pub fn child(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_owned())
        } else {
            Self(format!("{}{}{}", self.0, SEPARATOR, key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments, `nlevel()` in ltree terms.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The first `len` segments, `subpath(path, 0, len)` in ltree terms.
    pub fn truncate(&self, len: usize) -> Option<Self> {
        if len == 0 || len > self.depth() {
            return None;
        }
        let joined = self
            .segments()
            .take(len)
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string());
        Some(Self(joined))
    }

    /// Path with the last segment removed. None for a top-level item.
    pub fn parent(&self) -> Option<Self> {
        self.truncate(self.depth().checked_sub(1)?)
    }

    /// First segment. A top-level item is its own root.
    pub fn root(&self) -> Option<Self> {
        self.truncate(1)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Ancestor-or-self test, `self @> other` in ltree terms.
    pub fn contains(&self, other: &MaterializedPath) -> bool {
        let depth = self.depth();
        depth > 0 && other.truncate(depth).as_ref() == Some(self)
    }
}

impl Display for MaterializedPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.0)
    }
}

/// Which ancestor an `/{p|op}/{hash}/{parent}` request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ancestor {
    /// One level up.
    Parent,
    /// Thread root, the "original post".
    Op,
}

impl Ancestor {
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "p" => Some(Ancestor::Parent),
            "op" => Some(Ancestor::Op),
            _ => None,
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Ancestor::Parent => "p",
            Ancestor::Op => "op",
        }
    }

    /// Resolves the ancestor path of `path` in memory.
    pub fn resolve(&self, path: &MaterializedPath) -> Option<MaterializedPath> {
        match self {
            Ancestor::Parent => path.parent(),
            Ancestor::Op => path.root(),
        }
    }

    /// SQL expression for the number of leading segments to keep of `cur.path`.
    pub(crate) fn level_sql(&self) -> &'static str {
        match self {
            Ancestor::Parent => r#"nlevel("cur"."path") - 1"#,
            Ancestor::Op => "1",
        }
    }

    /// Join condition `cur` has to meet before it is truncated. A top-level
    /// item has no parent but is its own root.
    pub(crate) fn guard_sql(&self) -> Option<&'static str> {
        match self {
            Ancestor::Parent => Some(r#"nlevel("cur"."path") > 1"#),
            Ancestor::Op => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ancestor, MaterializedPath};

    #[test]
    fn test_depth_and_segments() {
        let path = MaterializedPath::new("aa.bb.cc");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["aa", "bb", "cc"]);
        assert_eq!(path.last(), Some("cc"));
        assert_eq!(MaterializedPath::default().depth(), 0);
    }

    #[test]
    fn test_parent_removes_last_segment() {
        for (path, parent) in [
            ("aa.bb.cc", Some("aa.bb")),
            ("aa.bb", Some("aa")),
            ("aa", None),
            ("", None),
        ] {
            assert_eq!(
                MaterializedPath::new(path).parent(),
                parent.map(MaterializedPath::new),
                "parent of {:?}",
                path
            );
        }
    }

    #[test]
    fn test_root_is_first_segment() {
        for (path, root) in [
            ("aa.bb.cc.dd", Some("aa")),
            ("aa.bb", Some("aa")),
            ("aa", Some("aa")),
            ("", None),
        ] {
            assert_eq!(
                MaterializedPath::new(path).root(),
                root.map(MaterializedPath::new),
                "root of {:?}",
                path
            );
        }
    }

    #[test]
    fn test_child_extends_path() {
        let root = MaterializedPath::new("aa");
        let reply = root.child("bb");
        assert_eq!(reply.as_str(), "aa.bb");
        assert_eq!(reply.parent(), Some(root));
        assert_eq!(MaterializedPath::default().child("aa").as_str(), "aa");
    }

    #[test]
    fn test_contains_is_ancestor_or_self() {
        let root = MaterializedPath::new("aa");
        let leaf = MaterializedPath::new("aa.bb.cc");
        assert!(root.contains(&leaf));
        assert!(leaf.contains(&leaf));
        assert!(!leaf.contains(&root));
        // Label boundaries matter, a plain prefix is not an ancestor.
        assert!(!MaterializedPath::new("a").contains(&MaterializedPath::new("aa.bb")));
    }

    #[test]
    fn test_ancestor_route() {
        assert_eq!(Ancestor::from_route("p"), Some(Ancestor::Parent));
        assert_eq!(Ancestor::from_route("op"), Some(Ancestor::Op));
        assert_eq!(Ancestor::from_route("x"), None);
        assert_eq!(Ancestor::Op.route(), "op");
    }

    #[test]
    fn test_ancestor_resolve() {
        let path = MaterializedPath::new("aa.bb.cc");
        assert_eq!(
            Ancestor::Parent.resolve(&path),
            Some(MaterializedPath::new("aa.bb"))
        );
        assert_eq!(Ancestor::Op.resolve(&path), Some(MaterializedPath::new("aa")));
        assert_eq!(Ancestor::Parent.resolve(&MaterializedPath::new("aa")), None);
    }
}
