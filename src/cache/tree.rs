//! Value Tree Module
//!
//! Nested mapping of key segments to stored values. All traversals are
//! iterative so that very deep key paths cannot exhaust the stack.

use std::collections::{hash_map, HashMap};

use serde_json::{Map, Value};

// == Node ==
/// A position in the value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Mapping of child segments ("directory")
    Branch(HashMap<String, Node>),
    /// Stored value
    Leaf(Value),
}

impl Node {
    /// Creates an empty branch.
    pub fn branch() -> Self {
        Node::Branch(HashMap::new())
    }

    /// Returns true if this node holds a stored value.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    // == Children ==
    /// Turns this node into a branch if it is a leaf, and returns its children.
    ///
    /// The leaf value, if any, is discarded.
    fn children_mut(&mut self) -> &mut HashMap<String, Node> {
        if self.is_leaf() {
            *self = Node::branch();
        }
        match self {
            Node::Branch(children) => children,
            Node::Leaf(_) => unreachable!("leaf was replaced by a branch"),
        }
    }

    // == To Value ==
    /// Copies this node out as a JSON value.
    ///
    /// A leaf yields its value; a branch yields an object mirroring its
    /// whole sub-tree.
    pub fn to_value(&self) -> Value {
        let children = match self {
            Node::Leaf(value) => return value.clone(),
            Node::Branch(children) => children,
        };

        // Post-order walk: one frame per open branch, plus the segment each
        // nested frame is stored under in its parent.
        let mut frames: Vec<(hash_map::Iter<'_, String, Node>, Map<String, Value>)> =
            vec![(children.iter(), Map::new())];
        let mut names: Vec<&str> = Vec::new();

        while let Some((iter, object)) = frames.last_mut() {
            match iter.next() {
                Some((name, Node::Leaf(value))) => {
                    object.insert(name.clone(), value.clone());
                }
                Some((name, Node::Branch(grandchildren))) => {
                    names.push(name);
                    frames.push((grandchildren.iter(), Map::new()));
                }
                None => {
                    let finished = frames.pop().map(|(_, object)| object).unwrap_or_default();
                    match (frames.last_mut(), names.pop()) {
                        (Some((_, parent)), Some(name)) => {
                            parent.insert(name.to_string(), Value::Object(finished));
                        }
                        _ => return Value::Object(finished),
                    }
                }
            }
        }

        Value::Object(Map::new())
    }
}

// == Dismantle ==
/// Drops a node without recursion.
///
/// Branches are emptied onto an explicit stack before being dropped, so a
/// sub-tree of any depth is released in constant stack space.
pub fn dismantle(node: Node) {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if let Node::Branch(mut children) = node {
            stack.extend(children.drain().map(|(_, child)| child));
        }
    }
}

// == Insertion ==
/// What an insert displaced.
#[derive(Debug, Default)]
pub struct Insertion {
    /// Depths (segment indexes) of intermediate leaves turned into branches
    pub shadowed: Vec<usize>,
    /// Node previously stored at the full path
    pub replaced: Option<Node>,
}

// == Value Tree ==
/// Root mapping of the cache.
#[derive(Debug, Default)]
pub struct ValueTree {
    root: HashMap<String, Node>,
}

impl ValueTree {
    // == Constructor ==
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Self {
            root: HashMap::new(),
        }
    }

    // == Insert ==
    /// Stores `value` as a leaf at the path given by `segments`.
    ///
    /// Missing intermediate branches are created and intermediate leaves are
    /// replaced by branches. Whatever was at the full path is overwritten.
    pub fn insert(&mut self, segments: &[&str], value: Value) -> Insertion {
        let mut insertion = Insertion::default();
        let Some((last, parents)) = segments.split_last() else {
            return insertion;
        };

        let mut children = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let node = children
                .entry((*segment).to_string())
                .or_insert_with(Node::branch);
            if node.is_leaf() {
                insertion.shadowed.push(depth);
            }
            children = node.children_mut();
        }

        insertion.replaced = children.insert((*last).to_string(), Node::Leaf(value));
        insertion
    }

    // == Get ==
    /// Resolves the node at the path given by `segments`.
    pub fn get(&self, segments: &[&str]) -> Option<&Node> {
        let (last, parents) = segments.split_last()?;

        let mut children = &self.root;
        for segment in parents {
            match children.get(*segment) {
                Some(Node::Branch(next)) => children = next,
                _ => return None,
            }
        }
        children.get(*last)
    }

    // == Remove ==
    /// Detaches the node at the path given by `segments` from its parent.
    ///
    /// Returns `None` when any segment along the path does not resolve.
    pub fn remove(&mut self, segments: &[&str]) -> Option<Node> {
        let (last, parents) = segments.split_last()?;

        let mut children = &mut self.root;
        for segment in parents {
            match children.get_mut(*segment) {
                Some(Node::Branch(next)) => children = next,
                _ => return None,
            }
        }
        children.remove(*last)
    }

    // == Clear ==
    /// Removes every node.
    pub fn clear(&mut self) {
        for (_, node) in self.root.drain() {
            dismantle(node);
        }
    }

    // == Is Empty ==
    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    // == Paths ==
    /// Collects the full path of every reachable node.
    pub fn paths(&self, separator: char) -> Vec<String> {
        let mut paths = Vec::new();
        let mut stack: Vec<(String, &Node)> = self
            .root
            .iter()
            .map(|(segment, node)| (segment.clone(), node))
            .collect();

        while let Some((path, node)) = stack.pop() {
            if let Node::Branch(children) = node {
                for (segment, child) in children {
                    stack.push((format!("{path}{separator}{segment}"), child));
                }
            }
            paths.push(path);
        }
        paths
    }
}

impl Drop for ValueTree {
    fn drop(&mut self) {
        self.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }

    #[test]
    fn test_insert_and_get_leaf() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a:b"), json!(1));

        assert_eq!(tree.get(&path("a:b")), Some(&Node::Leaf(json!(1))));
        assert!(matches!(tree.get(&path("a")), Some(Node::Branch(_))));
        assert_eq!(tree.get(&path("a:c")), None);
        assert_eq!(tree.get(&path("a:b:c")), None);
    }

    #[test]
    fn test_insert_overwrites_subtree() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a:b"), json!(1));
        let insertion = tree.insert(&path("a"), json!("flat"));

        assert!(matches!(insertion.replaced, Some(Node::Branch(_))));
        assert!(insertion.shadowed.is_empty());
        assert_eq!(tree.get(&path("a")), Some(&Node::Leaf(json!("flat"))));
        assert_eq!(tree.get(&path("a:b")), None);
    }

    #[test]
    fn test_deeper_key_shadows_leaf() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a"), json!(1));
        tree.insert(&path("a:b:c"), json!(2));
        let insertion = tree.insert(&path("a:b:c:d"), json!(3));

        assert_eq!(insertion.shadowed, vec![2]);
        assert_eq!(tree.get(&path("a:b:c:d")), Some(&Node::Leaf(json!(3))));
        assert!(matches!(tree.get(&path("a")), Some(Node::Branch(_))));
    }

    #[test]
    fn test_shadowed_depths_reported() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a"), json!(1));

        let insertion = tree.insert(&path("a:b"), json!(2));
        assert_eq!(insertion.shadowed, vec![0]);
        assert!(insertion.replaced.is_none());
    }

    #[test]
    fn test_branch_to_value() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a:b"), json!(1));
        tree.insert(&path("a:c"), json!(2));
        tree.insert(&path("a:d:e"), json!({"nested": true}));

        let value = tree.get(&path("a")).map(Node::to_value);
        assert_eq!(
            value,
            Some(json!({"b": 1, "c": 2, "d": {"e": {"nested": true}}}))
        );
    }

    #[test]
    fn test_empty_branch_to_value() {
        assert_eq!(Node::branch().to_value(), json!({}));
    }

    #[test]
    fn test_remove() {
        let mut tree = ValueTree::new();
        tree.insert(&path("x:y:z"), json!(1));

        assert!(tree.remove(&path("x:q")).is_none());
        assert!(tree.remove(&path("nope:y")).is_none());

        let removed = tree.remove(&path("x:y"));
        assert!(matches!(removed, Some(Node::Branch(_))));
        assert!(tree.get(&path("x:y:z")).is_none());
        assert!(matches!(tree.get(&path("x")), Some(Node::Branch(_))));
    }

    #[test]
    fn test_remove_through_leaf_is_noop() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a"), json!(1));

        assert!(tree.remove(&path("a:b")).is_none());
        assert_eq!(tree.get(&path("a")), Some(&Node::Leaf(json!(1))));
    }

    #[test]
    fn test_empty_segments_are_keys() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a::b"), json!(1));

        assert!(tree.get(&path("a:")).is_some());
        assert_eq!(tree.get(&path("a::b")), Some(&Node::Leaf(json!(1))));
    }

    #[test]
    fn test_paths() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a:b"), json!(1));
        tree.insert(&path("c"), json!(2));

        let mut paths = tree.paths(':');
        paths.sort();
        assert_eq!(paths, vec!["a", "a:b", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut tree = ValueTree::new();
        tree.insert(&path("a:b"), json!(1));
        tree.clear();

        assert!(tree.is_empty());
        assert!(tree.get(&path("a")).is_none());
    }

    #[test]
    fn test_deep_path_is_iterative() {
        let segments: Vec<String> = (0..20_000).map(|i| format!("s{i}")).collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let mut tree = ValueTree::new();
        tree.insert(&segments, json!("deep"));

        assert_eq!(tree.get(&segments), Some(&Node::Leaf(json!("deep"))));
        assert!(tree.get(&segments[..1]).is_some());

        if let Some(node) = tree.remove(&segments[..2]) {
            dismantle(node);
        }
        assert!(tree.get(&segments).is_none());

        let mut paths = tree.paths(':');
        paths.sort();
        assert_eq!(paths, vec!["s0"]);
    }

    #[test]
    fn test_deep_tree_drop() {
        let segments: Vec<String> = (0..20_000).map(|i| format!("s{i}")).collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let mut tree = ValueTree::new();
        tree.insert(&segments, json!(1));
        drop(tree);
    }
}
