//! TreeBin: left-leaning red-black tree backing a treeified bucket.
//!
//! Nodes are ordered by the entry's stored hash. Entries whose hashes are
//! equal share a node and are told apart with `K: Eq` by the caller, so
//! the tree itself never touches keys.

use core::cmp::Ordering;
use slotmap::DefaultKey;

type Link = Option<Box<TreeNode>>;

#[derive(Debug)]
struct TreeNode {
    hash: u64,
    slots: Vec<DefaultKey>,
    red: bool,
    left: Link,
    right: Link,
}

impl TreeNode {
    fn new(hash: u64, slot: DefaultKey) -> Self {
        Self {
            hash,
            slots: vec![slot],
            red: true,
            left: None,
            right: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TreeBin {
    root: Link,
    len: usize,
}

impl TreeBin {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_slots<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u64, DefaultKey)>,
    {
        let mut tree = Self::new();
        for (hash, slot) in entries {
            tree.insert(hash, slot);
        }
        tree
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, hash: u64, slot: DefaultKey) {
        let mut root = insert_at(self.root.take(), hash, slot);
        root.red = false;
        self.root = Some(root);
        self.len += 1;
    }

    /// Descend by hash, then let `eq` pick among the entries sharing it.
    pub(crate) fn find<F>(&self, hash: u64, mut eq: F) -> Option<DefaultKey>
    where
        F: FnMut(DefaultKey) -> bool,
    {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match hash.cmp(&node.hash) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return node.slots.iter().copied().find(|&s| eq(s)),
            }
        }
        None
    }

    /// Remove `slot` and rebuild the tree from what is left. Bins are
    /// small, so a rebuild is cheaper to keep correct than a red-black
    /// delete.
    pub(crate) fn remove(&mut self, slot: DefaultKey) -> bool {
        let mut entries = self.slots();
        let Some(pos) = entries.iter().position(|&(_, s)| s == slot) else {
            return false;
        };
        entries.remove(pos);
        *self = Self::from_slots(entries);
        true
    }

    /// Entries in hash order, moving the nodes out.
    pub(crate) fn into_slots(self) -> Vec<(u64, DefaultKey)> {
        let mut out = Vec::with_capacity(self.len);
        drain(self.root, &mut out);
        out
    }

    /// Entries in hash order.
    pub(crate) fn slots(&self) -> Vec<(u64, DefaultKey)> {
        let mut out = Vec::with_capacity(self.len);
        collect(&self.root, &mut out);
        out
    }
}

fn collect(link: &Link, out: &mut Vec<(u64, DefaultKey)>) {
    if let Some(node) = link {
        collect(&node.left, out);
        out.extend(node.slots.iter().map(|&s| (node.hash, s)));
        collect(&node.right, out);
    }
}

fn drain(link: Link, out: &mut Vec<(u64, DefaultKey)>) {
    if let Some(node) = link {
        let TreeNode {
            hash,
            slots,
            left,
            right,
            ..
        } = *node;
        drain(left, out);
        out.extend(slots.into_iter().map(|s| (hash, s)));
        drain(right, out);
    }
}

fn is_red(link: &Link) -> bool {
    link.as_ref().is_some_and(|n| n.red)
}

fn insert_at(link: Link, hash: u64, slot: DefaultKey) -> Box<TreeNode> {
    let mut h = match link {
        None => return Box::new(TreeNode::new(hash, slot)),
        Some(h) => h,
    };
    match hash.cmp(&h.hash) {
        Ordering::Less => h.left = Some(insert_at(h.left.take(), hash, slot)),
        Ordering::Greater => h.right = Some(insert_at(h.right.take(), hash, slot)),
        Ordering::Equal => h.slots.push(slot),
    }
    fix_up(h)
}

fn fix_up(mut h: Box<TreeNode>) -> Box<TreeNode> {
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h);
    }
    if is_red(&h.left) && h.left.as_ref().is_some_and(|l| is_red(&l.left)) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colors(&mut h);
    }
    h
}

fn rotate_left(mut h: Box<TreeNode>) -> Box<TreeNode> {
    let mut x = h.right.take().expect("rotate_left requires a right child");
    h.right = x.left.take();
    x.red = h.red;
    h.red = true;
    x.left = Some(h);
    x
}

fn rotate_right(mut h: Box<TreeNode>) -> Box<TreeNode> {
    let mut x = h.left.take().expect("rotate_right requires a left child");
    h.left = x.right.take();
    x.red = h.red;
    h.red = true;
    x.right = Some(h);
    x
}

fn flip_colors(h: &mut TreeNode) {
    h.red = !h.red;
    if let Some(l) = h.left.as_mut() {
        l.red = !l.red;
    }
    if let Some(r) = h.right.as_mut() {
        r.red = !r.red;
    }
}

#[cfg(test)]
impl TreeBin {
    /// Panics on any red-black violation; returns the black height.
    fn check(&self) -> usize {
        assert!(!is_red(&self.root), "root must be black");
        black_height(&self.root, None, None)
    }

    fn height(&self) -> usize {
        fn h(link: &Link) -> usize {
            link.as_ref().map_or(0, |n| 1 + h(&n.left).max(h(&n.right)))
        }
        h(&self.root)
    }
}

#[cfg(test)]
fn black_height(link: &Link, lo: Option<u64>, hi: Option<u64>) -> usize {
    let Some(n) = link else { return 1 };
    assert!(!is_red(&n.right), "red link leans right");
    if n.red {
        assert!(!is_red(&n.left), "two red links in a row");
    }
    assert!(lo.map_or(true, |lo| n.hash > lo), "hash order violated");
    assert!(hi.map_or(true, |hi| n.hash < hi), "hash order violated");
    assert!(!n.slots.is_empty());
    let l = black_height(&n.left, lo, Some(n.hash));
    let r = black_height(&n.right, Some(n.hash), hi);
    assert_eq!(l, r, "unequal black height");
    l + usize::from(!n.red)
}
