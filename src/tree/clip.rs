use crate::model::BlockNode;

/// Truncate a block tree to at most `total_blocks` nodes in pre-order.
///
/// Every node (root or nested) costs one unit. Copies share the input's
/// `Arc<Block>` and keep the presence or absence of `children` exactly as in
/// the source; a subtree cut by the budget is dropped without a marker.
///
/// Returns `None` only when `content` is `None`.
pub fn clip_content_blocks(
    content: Option<&[BlockNode]>,
    total_blocks: usize,
) -> Option<Vec<BlockNode>> {
    let content = content?;
    let mut remaining = total_blocks;
    let clipped = clip_nodes(content, &mut remaining);
    tracing::debug!(
        budget = total_blocks,
        kept = total_blocks - remaining,
        "clipped block tree"
    );
    Some(clipped)
}

fn clip_nodes(nodes: &[BlockNode], remaining: &mut usize) -> Vec<BlockNode> {
    let mut out = Vec::new();
    for node in nodes {
        if *remaining == 0 {
            break;
        }
        *remaining -= 1;
        let children = node
            .children
            .as_deref()
            .map(|children| clip_nodes(children, remaining));
        out.push(BlockNode {
            block: node.block.clone(),
            children,
        });
    }
    out
}

/// Total number of nodes in the forest, roots included.
pub fn count_nodes(nodes: &[BlockNode]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + count_nodes(node.child_nodes()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;
    use std::sync::Arc;

    fn leaf(id: &str) -> BlockNode {
        BlockNode::new(Block::paragraph(id, id))
    }

    fn parent(id: &str, children: Vec<BlockNode>) -> BlockNode {
        BlockNode::with_children(Block::paragraph(id, id), children)
    }

    fn sample() -> Vec<BlockNode> {
        vec![
            parent("a", vec![leaf("b"), parent("c", vec![leaf("d")])]),
            parent("e", vec![]),
            leaf("f"),
        ]
    }

    fn preorder_ids(nodes: &[BlockNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.id().to_string());
            preorder_ids(node.child_nodes(), out);
        }
    }

    #[test]
    fn test_clip_drops_trailing_sibling() {
        let tree = vec![parent("a", vec![leaf("b"), leaf("c")])];
        let clipped = clip_content_blocks(Some(&tree), 2).unwrap();
        assert_eq!(clipped, vec![parent("a", vec![leaf("b")])]);
    }

    #[test]
    fn test_clip_none_and_empty() {
        assert_eq!(clip_content_blocks(None, 10), None);
        assert_eq!(clip_content_blocks(Some(&[]), 10), Some(vec![]));
        assert_eq!(clip_content_blocks(Some(&sample()), 0), Some(vec![]));
    }

    #[test]
    fn test_clip_full_budget_preserves_shape() {
        let tree = sample();
        for budget in [count_nodes(&tree), count_nodes(&tree) + 5] {
            let clipped = clip_content_blocks(Some(&tree), budget).unwrap();
            assert_eq!(clipped, tree);
        }
    }

    #[test]
    fn test_clip_keeps_children_presence() {
        let tree = sample();
        let clipped = clip_content_blocks(Some(&tree), 6).unwrap();
        // "e" had an empty children array, "f" had none
        assert_eq!(clipped[1].children, Some(vec![]));
        assert_eq!(clipped[2].children, None);

        // budget exhausted right after a parent: it keeps an empty array
        let clipped = clip_content_blocks(Some(&tree), 1).unwrap();
        assert_eq!(clipped[0].children, Some(vec![]));
    }

    #[test]
    fn test_clip_count_and_preorder() {
        let tree = sample();
        let total = count_nodes(&tree);
        assert_eq!(total, 6);

        let mut all = Vec::new();
        preorder_ids(&tree, &mut all);

        for budget in 0..=total + 2 {
            let clipped = clip_content_blocks(Some(&tree), budget).unwrap();
            assert_eq!(count_nodes(&clipped), budget.min(total));

            let mut ids = Vec::new();
            preorder_ids(&clipped, &mut ids);
            assert_eq!(ids, all[..budget.min(total)].to_vec());
        }
    }

    #[test]
    fn test_clip_shares_blocks() {
        let tree = sample();
        let clipped = clip_content_blocks(Some(&tree), 3).unwrap();
        assert!(Arc::ptr_eq(&clipped[0].block, &tree[0].block));
        assert!(Arc::ptr_eq(
            &clipped[0].child_nodes()[1].block,
            &tree[0].child_nodes()[1].block
        ));
    }
}
