// Copyright 2025 the Talos Engine authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Dynamic BVH
//!
//! An incrementally balanced binary tree of AABBs keyed by physics handle,
//! used as the broad-phase search accelerator. Insertion picks the sibling
//! that minimizes the surface-area heuristic with a branch-and-bound
//! descent; removal collapses the parent into the sibling; both walk back
//! up the tree refitting boxes and rotating depth-unbalanced nodes.

use crate::error::BvhError;
use talos_core::math::{Aabb, Frustum, Ray};
use talos_core::physics::PhysicsHandle;

#[cfg(debug_assertions)]
use talos_core::physics::DebugRenderer;

/// Missing-link marker for node indices.
const SENTINEL: u16 = 0xFFFF;
/// Handle-field payload marking a branch node. The pattern uses an
/// impossible type tag so it can never collide with a real handle.
const BRANCH_PAYLOAD: u32 = 0xF000_FFFF;
/// Handle-field bit marking a freed (recycled) node slot.
const FREE_BIT: u32 = 0x0100_0000;
/// Handle-field mask holding the node depth.
const DEPTH_MASK: u32 = 0x00FF_0000;
const DEPTH_SHIFT: u32 = 16;
/// Capacity of the explicit traversal stack.
const STACK_CAPACITY: usize = 64;

/*
Node structure:
    Bounds: tight box for static objects, expanded box for moving ones.
    Handle: leaf payload plus the depth field and the allocation flag.
    Parent/Child1/Child2: indices into the node pool; SENTINEL if unset.
Allocation strategy:
    Free slots are flagged in the handle field and rescanned before the
    pool grows. The pool never exceeds 65 535 nodes.
*/
#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    handle: u32,
    parent: u16,
    child1: u16,
    child2: u16,
}

impl Node {
    #[inline]
    fn payload(&self) -> u32 {
        self.handle & !(DEPTH_MASK | FREE_BIT)
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.payload() != BRANCH_PAYLOAD
    }

    #[inline]
    fn is_free(&self) -> bool {
        self.handle & FREE_BIT != 0
    }

    #[inline]
    fn leaf_handle(&self) -> PhysicsHandle {
        PhysicsHandle(self.payload())
    }

    #[inline]
    fn depth(&self) -> u32 {
        (self.handle & DEPTH_MASK) >> DEPTH_SHIFT
    }

    #[inline]
    fn set_depth(&mut self, depth: u32) {
        self.handle = (self.handle & !DEPTH_MASK) | ((depth & 0xFF) << DEPTH_SHIFT);
    }
}

/// Fixed-capacity traversal stack; recursion is explicit in every query.
struct TraversalStack {
    entries: [u16; STACK_CAPACITY],
    top: usize,
}

impl TraversalStack {
    #[inline]
    fn new(root: u16) -> Self {
        let mut stack = Self {
            entries: [0; STACK_CAPACITY],
            top: 0,
        };
        stack.push(root);
        stack
    }

    #[inline]
    fn push(&mut self, idx: u16) {
        debug_assert!(self.top < STACK_CAPACITY, "BVH traversal stack overflow");
        self.entries[self.top] = idx;
        self.top += 1;
    }

    #[inline]
    fn pop(&mut self) -> Option<u16> {
        if self.top == 0 {
            return None;
        }
        self.top -= 1;
        Some(self.entries[self.top])
    }
}

/// A dynamic bounding-volume hierarchy over axis-aligned boxes.
#[derive(Debug, Default, Clone)]
pub struct Bvh {
    nodes: Vec<Node>,
    /// Number of live (non-freed) nodes.
    count: u16,
    root: u16,
}

impl Bvh {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            count: 0,
            root: SENTINEL,
        }
    }

    /// Returns the number of leaf nodes.
    #[inline]
    pub fn leaf_count(&self) -> u16 {
        (self.count + 1) / 2
    }

    /// Returns `true` when the tree holds a leaf for `handle`.
    pub fn contains(&self, handle: PhysicsHandle) -> bool {
        self.find_leaf(handle).is_some()
    }

    /// Inserts a new object into the tree.
    ///
    /// Fails when the handle is already present. Exhausting the 16-bit node
    /// pool is fatal and panics: the configured capacity is a hard limit.
    pub fn insert(&mut self, handle: PhysicsHandle, bounds: Aabb) -> Result<(), BvhError> {
        if self.contains(handle) {
            return Err(BvhError::HandleReused(handle));
        }

        let leaf = self.alloc_leaf(handle, bounds);
        if self.count == 1 {
            self.nodes[leaf as usize].parent = SENTINEL;
            self.root = leaf;
            return Ok(());
        }

        // Find the best sibling for the new leaf.
        let sibling = self.best_sibling(leaf);

        // Create a new parent branch above the sibling.
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.alloc_branch();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].bounds = bounds.merge(&self.nodes[sibling as usize].bounds);
        let depth = self.nodes[sibling as usize].depth() + 1;
        self.nodes[new_parent as usize].set_depth(depth);

        // The new parent becomes the root if the sibling was the old root.
        if old_parent != SENTINEL {
            if self.nodes[old_parent as usize].child1 == sibling {
                self.nodes[old_parent as usize].child1 = new_parent;
            } else {
                self.nodes[old_parent as usize].child2 = new_parent;
            }
        } else {
            self.root = new_parent;
        }

        self.nodes[new_parent as usize].child1 = sibling;
        self.nodes[new_parent as usize].child2 = leaf;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        // Walk back up the tree, refitting the bounding boxes.
        self.refit(new_parent);
        Ok(())
    }

    /// Removes the specified object from the tree.
    ///
    /// Fails when the handle is not present; the tree is left untouched in
    /// that case.
    pub fn remove(&mut self, handle: PhysicsHandle) -> Result<(), BvhError> {
        let leaf = self
            .find_leaf(handle)
            .ok_or(BvhError::UnknownHandle(handle))?;

        let old_parent = self.nodes[leaf as usize].parent;
        self.free_node(leaf);

        if old_parent == SENTINEL {
            // The leaf was the root; free_node already cleared it.
            return Ok(());
        }

        let sibling = if self.nodes[old_parent as usize].child1 == leaf {
            self.nodes[old_parent as usize].child2
        } else {
            self.nodes[old_parent as usize].child1
        };

        // Destroy the parent and connect the sibling to the grandparent.
        let grandparent = self.nodes[old_parent as usize].parent;
        if grandparent != SENTINEL {
            if self.nodes[grandparent as usize].child1 == old_parent {
                self.nodes[grandparent as usize].child1 = sibling;
            } else {
                self.nodes[grandparent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent = grandparent;
            self.free_node(old_parent);
            self.refit(grandparent);
        } else {
            // The sibling becomes the root when no grandparent exists.
            self.root = sibling;
            self.nodes[sibling as usize].parent = SENTINEL;
            self.free_node(old_parent);
        }

        Ok(())
    }

    /// Performs a basic raycast against the tree, returning the first leaf
    /// hit in traversal order.
    ///
    /// The tree is a search accelerator, not a sorter: the result is not
    /// necessarily the nearest hit.
    pub fn raycast(&self, ray: &Ray) -> Option<PhysicsHandle> {
        if self.count == 0 {
            return None;
        }
        let recip_dir = ray.recip_direction();

        let mut stack = TraversalStack::new(self.root);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if node.bounds.intersect_ray(ray.origin, recip_dir).is_some() {
                if node.is_leaf() {
                    return Some(node.leaf_handle());
                }
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }

        None
    }

    /// Collects the handles of every leaf whose box overlaps `bounds`.
    pub fn boxcast(&self, bounds: &Aabb, result: &mut Vec<PhysicsHandle>) {
        if self.count == 0 {
            return;
        }

        let mut stack = TraversalStack::new(self.root);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if bounds.intersects_aabb(&node.bounds) {
                if node.is_leaf() {
                    result.push(node.leaf_handle());
                } else {
                    stack.push(node.child1);
                    stack.push(node.child2);
                }
            }
        }
    }

    /// Collects the handles of every leaf whose box intersects the frustum.
    pub fn frustumcast(&self, frustum: &Frustum, result: &mut Vec<PhysicsHandle>) {
        if self.count == 0 {
            return;
        }

        let mut stack = TraversalStack::new(self.root);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            if frustum.intersects_aabb(&node.bounds) {
                if node.is_leaf() {
                    result.push(node.leaf_handle());
                } else {
                    stack.push(node.child1);
                    stack.push(node.child2);
                }
            }
        }
    }

    /// Returns the cost of the internal branches: the sum of their surface
    /// areas.
    pub fn tree_cost(&self) -> f32 {
        self.nodes
            .iter()
            .filter(|n| !n.is_free() && !n.is_leaf())
            .map(|n| n.bounds.surface_area())
            .sum()
    }

    /// Returns the relative efficiency of the tree: total leaf area over
    /// root area.
    pub fn efficiency(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }

        let leaf_area: f32 = self
            .nodes
            .iter()
            .filter(|n| !n.is_free() && n.is_leaf())
            .map(|n| n.bounds.surface_area())
            .sum();
        leaf_area / self.nodes[self.root as usize].bounds.surface_area()
    }

    /// Returns the depth of the root node.
    pub fn root_depth(&self) -> u32 {
        if self.count == 0 {
            0
        } else {
            self.nodes[self.root as usize].depth()
        }
    }

    /// Draws the boxes of every live node at the given depth.
    #[cfg(debug_assertions)]
    pub fn visualize(&self, renderer: &mut dyn DebugRenderer, display_depth: u32) {
        for node in &self.nodes {
            if !node.is_free() && node.depth() == display_depth {
                renderer.add_box(&node.bounds);
            }
        }
    }

    // --- Internal helpers ---

    fn find_leaf(&self, handle: PhysicsHandle) -> Option<u16> {
        self.nodes
            .iter()
            .position(|n| !n.is_free() && n.is_leaf() && n.leaf_handle() == handle)
            .map(|i| i as u16)
    }

    /// Branch-and-bound descent towards the sibling that minimizes the
    /// surface-area heuristic.
    fn best_sibling(&self, leaf: u16) -> u16 {
        let bounds = self.nodes[leaf as usize].bounds;
        let mut i = self.root;

        loop {
            let node = &self.nodes[i as usize];
            if node.is_leaf() {
                return i;
            }

            let c1 = node.child1;
            let c2 = node.child2;
            let area = node.bounds.surface_area();

            // Direct cost of pairing with this node, and the inherited cost
            // every descendant pays for the enlarged ancestor.
            let direct = node.bounds.merge(&bounds).surface_area();
            let cost = 2.0 * direct;
            let inherited = 2.0 * (direct - area);

            let child_cost = |child: u16| -> f32 {
                if child == SENTINEL {
                    return f32::MAX;
                }
                let child_node = &self.nodes[child as usize];
                let new_area = child_node.bounds.merge(&bounds).surface_area();
                if child_node.is_leaf() {
                    new_area + inherited
                } else {
                    (new_area - child_node.bounds.surface_area()) + inherited
                }
            };

            let cost1 = child_cost(c1);
            let cost2 = child_cost(c2);

            // Stop descending once pairing here beats both children.
            if cost < cost1 && cost < cost2 {
                return i;
            }

            i = if cost1 < cost2 { c1 } else { c2 };
        }
    }

    /// Walks from `start` up to the root, rebalancing and refitting every
    /// node on the way.
    fn refit(&mut self, start: u16) {
        let mut i = start;
        while i != SENTINEL {
            i = self.balance(i);

            let c1 = self.nodes[i as usize].child1;
            let c2 = self.nodes[i as usize].child2;
            debug_assert!(c1 != SENTINEL && c2 != SENTINEL);

            let merged = self.nodes[c1 as usize]
                .bounds
                .merge(&self.nodes[c2 as usize].bounds);
            let depth = 1 + self.nodes[c1 as usize]
                .depth()
                .max(self.nodes[c2 as usize].depth());

            self.nodes[i as usize].bounds = merged;
            self.nodes[i as usize].set_depth(depth);

            i = self.nodes[i as usize].parent;
        }
    }

    /// Performs a depth-balancing rotation at `i_a` when its children's
    /// depths differ by more than one. Returns the index now occupying the
    /// subtree root.
    fn balance(&mut self, i_a: u16) -> u16 {
        let a = self.nodes[i_a as usize];
        if a.is_leaf() || a.depth() < 2 {
            return i_a;
        }

        let i_b = a.child1;
        let i_c = a.child2;
        let balance = self.nodes[i_c as usize].depth() as i32 - self.nodes[i_b as usize].depth() as i32;

        // Rotate C up.
        if balance > 1 {
            let i_f = self.nodes[i_c as usize].child1;
            let i_g = self.nodes[i_c as usize].child2;

            // Swap A and C.
            self.nodes[i_c as usize].child1 = i_a;
            self.nodes[i_c as usize].parent = self.nodes[i_a as usize].parent;
            self.nodes[i_a as usize].parent = i_c;

            // A's old parent should point to C.
            let c_parent = self.nodes[i_c as usize].parent;
            if c_parent != SENTINEL {
                if self.nodes[c_parent as usize].child1 == i_a {
                    self.nodes[c_parent as usize].child1 = i_c;
                } else {
                    self.nodes[c_parent as usize].child2 = i_c;
                }
            } else {
                self.root = i_c;
            }

            // Rotate the deeper grandchild up next to A's kept child.
            if self.nodes[i_f as usize].depth() > self.nodes[i_g as usize].depth() {
                self.nodes[i_c as usize].child2 = i_f;
                self.nodes[i_a as usize].child2 = i_g;
                self.nodes[i_g as usize].parent = i_a;
            } else {
                self.nodes[i_c as usize].child2 = i_g;
                self.nodes[i_a as usize].child2 = i_f;
                self.nodes[i_f as usize].parent = i_a;
            }

            self.update_node(i_a);
            self.update_node(i_c);
            return i_c;
        }

        // Rotate B up.
        if balance < -1 {
            let i_d = self.nodes[i_b as usize].child1;
            let i_e = self.nodes[i_b as usize].child2;

            // Swap A and B.
            self.nodes[i_b as usize].child1 = i_a;
            self.nodes[i_b as usize].parent = self.nodes[i_a as usize].parent;
            self.nodes[i_a as usize].parent = i_b;

            // A's old parent should point to B.
            let b_parent = self.nodes[i_b as usize].parent;
            if b_parent != SENTINEL {
                if self.nodes[b_parent as usize].child1 == i_a {
                    self.nodes[b_parent as usize].child1 = i_b;
                } else {
                    self.nodes[b_parent as usize].child2 = i_b;
                }
            } else {
                self.root = i_b;
            }

            if self.nodes[i_d as usize].depth() > self.nodes[i_e as usize].depth() {
                self.nodes[i_b as usize].child2 = i_d;
                self.nodes[i_a as usize].child1 = i_e;
                self.nodes[i_e as usize].parent = i_a;
            } else {
                self.nodes[i_b as usize].child2 = i_e;
                self.nodes[i_a as usize].child1 = i_d;
                self.nodes[i_d as usize].parent = i_a;
            }

            self.update_node(i_a);
            self.update_node(i_b);
            return i_b;
        }

        i_a
    }

    /// Recomputes a branch's box and depth from its children.
    fn update_node(&mut self, i: u16) {
        let c1 = self.nodes[i as usize].child1;
        let c2 = self.nodes[i as usize].child2;
        let merged = self.nodes[c1 as usize]
            .bounds
            .merge(&self.nodes[c2 as usize].bounds);
        let depth = 1 + self.nodes[c1 as usize]
            .depth()
            .max(self.nodes[c2 as usize].depth());
        self.nodes[i as usize].bounds = merged;
        self.nodes[i as usize].set_depth(depth);
    }

    fn alloc_branch(&mut self) -> u16 {
        // Reuse a freed slot before growing the pool.
        if (self.count as usize) < self.nodes.len() {
            self.count += 1;
            for (i, node) in self.nodes.iter_mut().enumerate() {
                if node.is_free() {
                    node.handle = BRANCH_PAYLOAD;
                    node.parent = SENTINEL;
                    node.child1 = SENTINEL;
                    node.child2 = SENTINEL;
                    return i as u16;
                }
            }
            unreachable!("BVH node count corruption detected");
        }

        assert!(
            self.nodes.len() < SENTINEL as usize,
            "BVH node pool exhausted (65535 nodes)"
        );

        self.nodes.push(Node {
            bounds: Aabb::INVALID,
            handle: BRANCH_PAYLOAD,
            parent: SENTINEL,
            child1: SENTINEL,
            child2: SENTINEL,
        });
        self.count += 1;
        (self.nodes.len() - 1) as u16
    }

    fn alloc_leaf(&mut self, handle: PhysicsHandle, bounds: Aabb) -> u16 {
        let i = self.alloc_branch();
        let node = &mut self.nodes[i as usize];
        node.handle = handle.0;
        node.bounds = bounds;
        node.child1 = SENTINEL;
        node.child2 = SENTINEL;
        i
    }

    fn free_node(&mut self, i: u16) {
        self.count -= 1;
        if i == self.root {
            self.root = SENTINEL;
        }

        let node = &mut self.nodes[i as usize];
        node.handle = FREE_BIT;
        node.parent = SENTINEL;
        node.child1 = SENTINEL;
        node.child2 = SENTINEL;
        node.bounds = Aabb::INVALID;
    }
}
