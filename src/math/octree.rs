//! A loose octree over bounding boxes with a caller-supplied split rule.
//!
//! Items are stored in every leaf their bounding box touches, so a leaf
//! lists everything that might interact inside its cell. Queries return each
//! item once, deduplicated by [`OctreeItem::key`].

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Result;

use super::bbox::Aabb;
use super::Point3;

/// Something that can be stored in an [`Octree`].
pub trait OctreeItem: Clone {
    /// Identity used to deduplicate query results.
    type Key: Copy + Eq + Hash;

    fn key(&self) -> Self::Key;

    fn bounds(&self) -> Aabb;
}

/// Decides when a leaf must be subdivided.
pub trait SplitRule<T> {
    /// Called after an item was added to a leaf at `depth`.
    fn must_split(&self, items: &[T], depth: usize) -> bool;

    /// Called for every item of a leaf about to be split at `center`.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the insertion that triggered the split.
    fn check_split(&self, item: &T, center: &Point3) -> Result<()>;
}

enum Node<T> {
    Leaf(Vec<T>),
    Branch(Box<[Node<T>; 8]>),
}

/// Octree over a fixed cubic region.
pub struct Octree<T, R> {
    cube: Aabb,
    root: Node<T>,
    rule: R,
    max_depth: usize,
    len: usize,
}

impl<T: OctreeItem, R: SplitRule<T>> Octree<T, R> {
    /// Creates an empty octree covering `cube`.
    ///
    /// Leaves are never split below `max_depth`, whatever the rule says.
    #[must_use]
    pub fn new(cube: Aabb, rule: R, max_depth: usize) -> Self {
        Self {
            cube,
            root: Node::Leaf(Vec::new()),
            rule,
            max_depth,
            len: 0,
        }
    }

    /// The region covered by the tree.
    #[must_use]
    pub fn cube(&self) -> &Aabb {
        &self.cube
    }

    /// Number of inserted items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts an item into every leaf its bounds touch.
    ///
    /// # Errors
    ///
    /// Propagates the split rule's rejection of a subdivision.
    pub fn insert(&mut self, item: T) -> Result<()> {
        let bounds = item.bounds();
        if !bounds.overlaps(&self.cube) {
            return Ok(());
        }
        insert_into(
            &mut self.root,
            self.cube,
            0,
            &item,
            &bounds,
            &self.rule,
            self.max_depth,
        )?;
        self.len += 1;
        Ok(())
    }

    /// Returns every item whose bounds overlap `region`, each once.
    #[must_use]
    pub fn query(&self, region: &Aabb) -> Vec<&T> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![(&self.root, self.cube)];
        while let Some((node, cell)) = stack.pop() {
            if !cell.overlaps(region) {
                continue;
            }
            match node {
                Node::Leaf(items) => {
                    for item in items {
                        if item.bounds().overlaps(region) && seen.insert(item.key()) {
                            out.push(item);
                        }
                    }
                }
                Node::Branch(children) => {
                    for (i, child) in children.iter().enumerate() {
                        stack.push((child, child_cell(&cell, i)));
                    }
                }
            }
        }
        out
    }

    /// Returns the items close to `point`, within `radius`.
    #[must_use]
    pub fn neighbors(&self, point: &Point3, radius: f64) -> Vec<&T> {
        self.query(&Aabb::new(*point, *point).expanded(radius))
    }

    /// Returns the contents of every non-empty leaf.
    #[must_use]
    pub fn leaves(&self) -> Vec<&[T]> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(items) if !items.is_empty() => out.push(items.as_slice()),
                Node::Leaf(_) => {}
                Node::Branch(children) => stack.extend(children.iter()),
            }
        }
        out
    }
}

fn child_cell(cell: &Aabb, index: usize) -> Aabb {
    let c = cell.center();
    let pick = |bit: usize, lo: f64, mid: f64, hi: f64| {
        if index & bit == 0 {
            (lo, mid)
        } else {
            (mid, hi)
        }
    };
    let (x0, x1) = pick(1, cell.min.x, c.x, cell.max.x);
    let (y0, y1) = pick(2, cell.min.y, c.y, cell.max.y);
    let (z0, z1) = pick(4, cell.min.z, c.z, cell.max.z);
    Aabb {
        min: Point3::new(x0, y0, z0),
        max: Point3::new(x1, y1, z1),
    }
}

fn insert_into<T: OctreeItem, R: SplitRule<T>>(
    node: &mut Node<T>,
    cell: Aabb,
    depth: usize,
    item: &T,
    bounds: &Aabb,
    rule: &R,
    max_depth: usize,
) -> Result<()> {
    if let Node::Branch(children) = node {
        for (i, child) in children.iter_mut().enumerate() {
            let sub = child_cell(&cell, i);
            if sub.overlaps(bounds) {
                insert_into(child, sub, depth + 1, item, bounds, rule, max_depth)?;
            }
        }
        return Ok(());
    }
    if let Node::Leaf(items) = node {
        items.push(item.clone());
    }
    let crowded =
        matches!(node, Node::Leaf(items) if depth < max_depth && rule.must_split(items, depth));
    if crowded {
        split_leaf(node, cell, depth, rule, max_depth)?;
    }
    Ok(())
}

fn split_leaf<T: OctreeItem, R: SplitRule<T>>(
    node: &mut Node<T>,
    cell: Aabb,
    depth: usize,
    rule: &R,
    max_depth: usize,
) -> Result<()> {
    let items = match node {
        Node::Leaf(items) => std::mem::take(items),
        Node::Branch(_) => return Ok(()),
    };
    let center = cell.center();
    if let Some(err) = items.iter().find_map(|item| rule.check_split(item, &center).err()) {
        *node = Node::Leaf(items);
        return Err(err);
    }

    let mut children: [Node<T>; 8] = std::array::from_fn(|_| Node::Leaf(Vec::new()));
    for item in items {
        let bounds = item.bounds();
        for (i, child) in children.iter_mut().enumerate() {
            if let Node::Leaf(list) = child {
                if child_cell(&cell, i).overlaps(&bounds) {
                    list.push(item.clone());
                }
            }
        }
    }
    for (i, child) in children.iter_mut().enumerate() {
        let crowded =
            matches!(child, Node::Leaf(list) if depth + 1 < max_depth && rule.must_split(list, depth + 1));
        if crowded {
            split_leaf(child, child_cell(&cell, i), depth + 1, rule, max_depth)?;
        }
    }
    *node = Node::Branch(Box::new(children));
    Ok(())
}
