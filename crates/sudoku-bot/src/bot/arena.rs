use std::ops::{Index, IndexMut};

/// Index of a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Contiguous node storage for one decision; freed as a whole.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    nodes: Vec<T>,
}

impl<T> Arena<T> {
    pub fn with_root(root: T) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn allocate(&mut self, node: T) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &T {
        &self.nodes[id.index()]
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::{Arena, NodeId};

    #[test]
    fn allocation_hands_out_sequential_ids() {
        let mut arena = Arena::with_root("root");
        let a = arena.allocate("a");
        let b = arena.allocate("b");
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(arena[NodeId::ROOT], "root");
        arena[b] = "b2";
        assert_eq!(arena[b], "b2");
        assert_eq!(arena.len(), 3);
    }
}
