use std::collections::HashSet;

use indexmap::IndexSet;

use crate::model::BlockNode;

/// Pre-order iterator over a block forest, parents before children.
pub struct Preorder<'a> {
    stack: Vec<std::slice::Iter<'a, BlockNode>>,
}

impl<'a> Preorder<'a> {
    pub fn new(nodes: &'a [BlockNode]) -> Self {
        Self {
            stack: vec![nodes.iter()],
        }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a BlockNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(node) => {
                    self.stack.push(node.child_nodes().iter());
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Find a node by block id. The first match in pre-order wins.
///
/// An empty id never matches.
pub fn find_by_id<'a>(nodes: &'a [BlockNode], id: &str) -> Option<&'a BlockNode> {
    if id.is_empty() {
        return None;
    }
    Preorder::new(nodes).find(|node| node.id() == id)
}

/// Nodes to render when a view focuses on one block.
///
/// Without a focus the whole forest is returned. A focus on a missing id
/// yields `None` so nothing is rendered.
pub fn focused_blocks<'a>(nodes: &'a [BlockNode], focus: Option<&str>) -> Option<&'a [BlockNode]> {
    match focus {
        None => Some(nodes),
        Some(id) => find_by_id(nodes, id).map(std::slice::from_ref),
    }
}

/// Chain of nodes from a root down to the block with `id`, inclusive.
pub fn block_path<'a>(nodes: &'a [BlockNode], id: &str) -> Option<Vec<&'a BlockNode>> {
    if id.is_empty() {
        return None;
    }
    let mut path = Vec::new();
    if walk_path(nodes, id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn walk_path<'a>(nodes: &'a [BlockNode], id: &str, path: &mut Vec<&'a BlockNode>) -> bool {
    for node in nodes {
        path.push(node);
        if node.id() == id || walk_path(node.child_nodes(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Block ids that occur more than once, in order of first repetition.
pub fn validate_unique_ids(nodes: &[BlockNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = IndexSet::new();
    for node in Preorder::new(nodes) {
        if !seen.insert(node.id()) {
            duplicates.insert(node.id().to_string());
        }
    }
    duplicates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    fn leaf(id: &str) -> BlockNode {
        BlockNode::new(Block::paragraph(id, format!("text {id}")))
    }

    fn parent(id: &str, children: Vec<BlockNode>) -> BlockNode {
        BlockNode::with_children(Block::paragraph(id, format!("text {id}")), children)
    }

    fn sample() -> Vec<BlockNode> {
        vec![
            parent("a", vec![leaf("b"), parent("c", vec![leaf("d")])]),
            leaf("e"),
        ]
    }

    #[test]
    fn test_find_nested_child() {
        let tree = vec![parent("x", vec![leaf("y")])];
        let found = find_by_id(&tree, "y").unwrap();
        assert_eq!(found, &leaf("y"));
    }

    #[test]
    fn test_find_every_id() {
        let tree = sample();
        for id in ["a", "b", "c", "d", "e"] {
            assert_eq!(find_by_id(&tree, id).map(BlockNode::id), Some(id));
        }
        assert!(find_by_id(&tree, "zzz").is_none());
        assert!(find_by_id(&tree, "").is_none());
        assert!(find_by_id(&[], "a").is_none());
    }

    #[test]
    fn test_find_first_duplicate_wins() {
        let mut first = leaf("dup");
        first.block = std::sync::Arc::new(Block::paragraph("dup", "first"));
        let tree = vec![parent("p", vec![first]), leaf("dup")];
        assert_eq!(find_by_id(&tree, "dup").unwrap().block.text, "first");
    }

    #[test]
    fn test_preorder_order() {
        let ids: Vec<_> = Preorder::new(&sample()).map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_focused_blocks() {
        let tree = sample();
        assert_eq!(focused_blocks(&tree, None).map(<[_]>::len), Some(2));
        let focused = focused_blocks(&tree, Some("c")).unwrap();
        assert_eq!(focused.len(), 1);
        assert_eq!(focused[0].id(), "c");
        assert!(focused_blocks(&tree, Some("missing")).is_none());
    }

    #[test]
    fn test_block_path() {
        let tree = sample();
        let path: Vec<_> = block_path(&tree, "d")
            .unwrap()
            .into_iter()
            .map(BlockNode::id)
            .collect();
        assert_eq!(path, vec!["a", "c", "d"]);
        assert!(block_path(&tree, "nope").is_none());
    }

    #[test]
    fn test_validate_unique_ids() {
        assert!(validate_unique_ids(&sample()).is_empty());
        let tree = vec![
            parent("a", vec![leaf("b"), leaf("a")]),
            leaf("b"),
            leaf("b"),
        ];
        assert_eq!(validate_unique_ids(&tree), vec!["a", "b"]);
    }
}
