//! Partition of the variables into blocks of jointly constrained variables.
//!
//! Two variables share a block when they are transitively linked by a
//! finite octagonal bound. Variables outside every block carry no finite
//! bound at all and their matrix entries are implicitly trivial, which is
//! what lets the closure kernels run per block instead of over the whole
//! matrix. The original formulation used singly-linked lists of variable
//! indices; here each block is a sorted index vector and a membership
//! table gives constant-time lookup.

use alloc::vec::Vec;

use bitvec::vec::BitVec;

/// Identifier of a block inside a [`VariablePartition`].
///
/// Identifiers are dense indices and may be invalidated by any operation
/// that merges or removes blocks.
pub type ComponentId = usize;

/// A block of jointly constrained variables, kept sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    variables: Vec<usize>,
}

impl Component {
    fn singleton(variable: usize) -> Self {
        Self { variables: vec![variable] }
    }

    /// Number of variables in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the block holds no variable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// The variables of the block in increasing order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.variables
    }

    /// Returns an iterator over the variables in increasing order.
    pub fn iter(&self) -> core::iter::Copied<core::slice::Iter<'_, usize>> {
        self.variables.iter().copied()
    }

    /// Whether the block contains the given variable.
    #[must_use]
    pub fn contains(&self, variable: usize) -> bool {
        self.variables.binary_search(&variable).is_ok()
    }

    fn insert(&mut self, variable: usize) {
        if let Err(position) = self.variables.binary_search(&variable) {
            self.variables.insert(position, variable);
        }
    }

    fn remove(&mut self, variable: usize) {
        if let Ok(position) = self.variables.binary_search(&variable) {
            self.variables.remove(position);
        }
    }

    /// Merges another sorted block into this one in `O(k₁ + k₂)`.
    fn merge_from(&mut self, other: &Component) {
        let mut merged = Vec::with_capacity(self.len() + other.len());
        let mut left = self.variables.iter().copied().peekable();
        let mut right = other.variables.iter().copied().peekable();
        loop {
            match (left.peek(), right.peek()) {
                (Some(&l), Some(&r)) => {
                    if l <= r {
                        merged.push(l);
                        left.next();
                        if l == r {
                            right.next();
                        }
                    } else {
                        merged.push(r);
                        right.next();
                    }
                }
                (Some(&l), None) => {
                    merged.push(l);
                    left.next();
                }
                (None, Some(&r)) => {
                    merged.push(r);
                    right.next();
                }
                (None, None) => break,
            }
        }
        self.variables = merged;
    }
}

impl<'a> IntoIterator for &'a Component {
    type Item = usize;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Disjoint sorted blocks of jointly constrained variables.
#[derive(Debug, Clone)]
pub struct VariablePartition {
    membership: Vec<Option<ComponentId>>,
    components: Vec<Component>,
}

impl VariablePartition {
    /// Returns the empty partition over `dim` variables.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { membership: vec![None; dim], components: Vec::new() }
    }

    /// Number of variables the partition ranges over.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.membership.len()
    }

    /// Whether no variable belongs to any block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of blocks.
    #[must_use]
    pub fn number_of_components(&self) -> usize {
        self.components.len()
    }

    /// Total number of variables held by the blocks.
    #[must_use]
    pub fn constrained_variables(&self) -> usize {
        self.components.iter().map(Component::len).sum()
    }

    /// Returns an iterator over the blocks.
    pub fn components(&self) -> core::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// The block with the given identifier.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id]
    }

    /// The block holding the given variable, if any.
    #[must_use]
    pub fn find(&self, variable: usize) -> Option<ComponentId> {
        self.membership[variable]
    }

    /// Whether the given variable belongs to any block.
    #[must_use]
    pub fn contains(&self, variable: usize) -> bool {
        self.membership[variable].is_some()
    }

    /// Whether the two variables belong to the same block.
    #[must_use]
    pub fn is_connected(&self, left: usize, right: usize) -> bool {
        match (self.find(left), self.find(right)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Bitmap of the variables held by any block.
    #[must_use]
    pub fn membership_bitmap(&self) -> BitVec {
        let mut bitmap = BitVec::repeat(false, self.dim());
        for component in &self.components {
            for variable in component {
                bitmap.set(variable, true);
            }
        }
        bitmap
    }

    /// Creates a new block holding only the given variable.
    pub fn singleton(&mut self, variable: usize) -> ComponentId {
        debug_assert!(
            self.membership[variable].is_none(),
            "the variable already belongs to a block",
        );
        let id = self.components.len();
        self.components.push(Component::singleton(variable));
        self.membership[variable] = Some(id);
        id
    }

    /// Adds a variable to an existing block, keeping it sorted.
    pub fn insert(&mut self, variable: usize, id: ComponentId) {
        debug_assert!(
            self.membership[variable].is_none(),
            "the variable already belongs to a block",
        );
        self.components[id].insert(variable);
        self.membership[variable] = Some(id);
    }

    /// The block of the given variable, creating a fresh singleton block
    /// when it had none.
    pub fn ensure(&mut self, variable: usize) -> ComponentId {
        match self.find(variable) {
            Some(id) => id,
            None => self.singleton(variable),
        }
    }

    /// Merges the block `from` into the block `into`, preserving the sort
    /// order, and returns the identifier of the surviving block.
    pub fn merge(&mut self, into: ComponentId, from: ComponentId) -> ComponentId {
        if into == from {
            return into;
        }
        let absorbed = core::mem::take(&mut self.components[from]);
        for variable in &absorbed {
            self.membership[variable] = Some(into);
        }
        self.components[into].merge_from(&absorbed);
        self.drop_component_slot(from, into)
    }

    /// Merges the blocks of the two variables, creating singleton blocks
    /// for variables that had none, and returns the surviving block.
    pub fn merge_containing(&mut self, left: usize, right: usize) -> ComponentId {
        let into = self.ensure(left);
        match self.find(right) {
            Some(id) => self.merge(into, id),
            None => {
                self.insert(right, into);
                into
            }
        }
    }

    /// Removes a variable from its block; an emptied block disappears.
    pub fn detach(&mut self, variable: usize) {
        let Some(id) = self.membership[variable] else {
            return;
        };
        self.membership[variable] = None;
        self.components[id].remove(variable);
        if self.components[id].is_empty() {
            let _ = self.drop_component_slot(id, id);
        }
    }

    /// Coarsens this partition so every block of `other` is contained in
    /// a single block of the result.
    pub fn union_with(&mut self, other: &VariablePartition) {
        debug_assert_eq!(self.dim(), other.dim(), "partition dimensions differ");
        for component in other.components() {
            let mut variables = component.iter();
            let Some(first) = variables.next() else {
                continue;
            };
            let mut id = self.ensure(first);
            for variable in variables {
                id = match self.find(variable) {
                    Some(found) => self.merge(id, found),
                    None => {
                        self.insert(variable, id);
                        id
                    }
                };
            }
        }
    }

    /// The coarsest partition finer than both operands: variables end up
    /// in the same block exactly when they share a block on both sides.
    /// Variables missing from either side are left out entirely.
    #[must_use]
    pub fn common_refinement(&self, other: &VariablePartition) -> VariablePartition {
        debug_assert_eq!(self.dim(), other.dim(), "partition dimensions differ");
        let mut result = VariablePartition::new(self.dim());
        let stride = other.components.len();
        let mut table: Vec<Option<ComponentId>> = vec![None; self.components.len() * stride];
        for variable in 0..self.dim() {
            if let (Some(a), Some(b)) = (self.find(variable), other.find(variable)) {
                let key = a * stride + b;
                match table[key] {
                    Some(id) => result.insert(variable, id),
                    None => table[key] = Some(result.singleton(variable)),
                }
            }
        }
        result
    }

    /// The partition whose blocks are the images of this partition's
    /// blocks under the given variable permutation.
    #[must_use]
    pub fn permuted(&self, permutation: &[usize]) -> VariablePartition {
        debug_assert_eq!(self.dim(), permutation.len(), "permutation length differs");
        let mut result = VariablePartition::new(self.dim());
        for component in &self.components {
            let mut variables: Vec<usize> =
                component.iter().map(|variable| permutation[variable]).collect();
            variables.sort_unstable();
            result.push_block(variables);
        }
        result
    }

    /// Appends a sorted block disjoint from the existing ones.
    pub(crate) fn push_block(&mut self, variables: Vec<usize>) -> ComponentId {
        debug_assert!(variables.is_sorted(), "blocks must be sorted");
        let id = self.components.len();
        for &variable in &variables {
            debug_assert!(
                self.membership[variable].is_none(),
                "the variable already belongs to a block",
            );
            self.membership[variable] = Some(id);
        }
        self.components.push(Component { variables });
        id
    }

    /// Removes the (emptied) slot `slot`, compacting the block vector.
    /// Returns where `tracked` ended up after compaction.
    fn drop_component_slot(&mut self, slot: ComponentId, tracked: ComponentId) -> ComponentId {
        let moved = self.components.len() - 1;
        let _ = self.components.swap_remove(slot);
        if slot == moved {
            return tracked;
        }
        let relocated = self.components[slot].clone();
        for variable in &relocated {
            self.membership[variable] = Some(slot);
        }
        if tracked == moved { slot } else { tracked }
    }

    fn blocks_sorted(&self) -> Vec<&[usize]> {
        let mut blocks: Vec<&[usize]> =
            self.components.iter().map(Component::as_slice).collect();
        blocks.sort_unstable_by_key(|block| block.first().copied());
        blocks
    }
}

impl PartialEq for VariablePartition {
    fn eq(&self, other: &Self) -> bool {
        self.dim() == other.dim() && self.blocks_sorted() == other.blocks_sorted()
    }
}

impl Eq for VariablePartition {}
