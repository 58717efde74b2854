use super::*;

impl Dom {
    /// Nearest ancestor of `node_id` carrying `class_name` as a whole token.
    ///
    /// The search starts at the node's parent; the node itself is never
    /// tested. It stops at the document-boundary sentinel (`<body>` or the
    /// document node), which is still tested for the class before the walk
    /// ends. Starting at the boundary yields `None` immediately.
    pub fn find_ancestor_by_class(&self, node_id: NodeId, class_name: &str) -> Option<NodeId> {
        if self.is_boundary(node_id) {
            return None;
        }
        let parent = self.parent(node_id)?;
        self.find_self_or_ancestor_by_class(parent, class_name)
    }

    fn find_self_or_ancestor_by_class(&self, node_id: NodeId, class_name: &str) -> Option<NodeId> {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if self.has_class(current, class_name) {
                return Some(current);
            }
            if self.is_boundary(current) {
                return None;
            }
            cursor = self.parent(current);
        }
        None
    }

    pub(crate) fn is_boundary(&self, node_id: NodeId) -> bool {
        if node_id == self.root {
            return true;
        }
        self.tag_name(node_id)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("body"))
    }
}
