//! Property paths identifying a position inside a candidate value.
//!
//! A path always starts at the root (`@`) and grows one segment per
//! traversal step. Rendering:
//!
//! - object property `key`   → `.key`
//! - array index `3`         → `[3]`
//! - hash traversal key      → `[key]`   (object walked through `items`)

use std::fmt;

use serde::Serialize;

/// One traversal step below the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathSegment {
    /// A literally (or glob-) declared object property.
    Key(String),
    /// An array element position.
    Index(usize),
    /// An object key reached through an `items` schema.
    HashKey(String),
}

/// An ordered list of segments from the candidate root.
///
/// Cloning is cheap enough for traversal use; each child extends its
/// parent's path by one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyPath(Vec<PathSegment>);

impl PropertyPath {
    /// The root path, rendered as `@`.
    pub fn root() -> Self {
        PropertyPath(Vec::new())
    }

    /// Extend with an object property segment.
    pub fn key(&self, name: &str) -> Self {
        self.push(PathSegment::Key(name.to_string()))
    }

    /// Extend with an array index segment.
    pub fn index(&self, i: usize) -> Self {
        self.push(PathSegment::Index(i))
    }

    /// Extend with a hash traversal segment.
    pub fn hash_key(&self, name: &str) -> Self {
        self.push(PathSegment::HashKey(name.to_string()))
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        PropertyPath(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
                PathSegment::HashKey(k) => write!(f, "[{}]", k)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_at_sign() {
        assert_eq!(PropertyPath::root().to_string(), "@");
    }

    #[test]
    fn mixed_segments_render_in_order() {
        let path = PropertyPath::root().key("lorem").index(2).key("ipsum");
        assert_eq!(path.to_string(), "@.lorem[2].ipsum");
    }

    #[test]
    fn hash_keys_render_in_brackets() {
        let path = PropertyPath::root().key("specs").hash_key("width");
        assert_eq!(path.to_string(), "@.specs[width]");
    }

    #[test]
    fn child_paths_do_not_alias_the_parent() {
        let parent = PropertyPath::root().key("a");
        let child = parent.index(0);
        assert_eq!(parent.to_string(), "@.a");
        assert_eq!(child.to_string(), "@.a[0]");
    }
}
