//! Variable activities for the branching heuristic.
//!
//! Every variable has an activity value. After each conflict the variables involved in deriving
//! the learnt constraint are bumped by a constant and then all activities decay by a common
//! factor. Decisions branch on the unassigned variable of highest activity.
//!
//! Variables appearing in a falsified or explaining constraint count as involved, independent of
//! the constraint kind.

use ordered_float::OrderedFloat;

use crate::config::SolverConfig;
use crate::lit::Var;

/// Activity ordered heap of variables.
///
/// Instead of decaying every activity on each conflict the bump value grows by the inverse decay
/// factor. All values get scaled down together before they would overflow, which keeps the order
/// of activities intact.
pub struct Vsids {
    activity: Vec<OrderedFloat<f32>>,
    /// Binary max-heap of the variables available for decisions.
    heap: Vec<Var>,
    /// Heap index of each variable.
    position: Vec<Option<usize>>,
    bump: f32,
    inv_decay: f32,
}

impl Default for Vsids {
    fn default() -> Vsids {
        Vsids {
            activity: vec![],
            heap: vec![],
            position: vec![],
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().vsids_decay,
        }
    }
}

impl Vsids {
    /// Update structures for a new variable count.
    ///
    /// New variables start with zero activity and are available.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        self.heap.retain(|var| var.index() < count);
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);
        self.rebuild();

        for index in old_count..count {
            self.make_available(Var::from_index(index));
        }
    }

    fn rescale_limit() -> f32 {
        std::f32::MAX / 16.0
    }

    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }

    pub fn activity(&self, var: Var) -> f32 {
        self.activity[var.index()].0
    }

    /// Increase the activity of a variable.
    pub fn bump(&mut self, var: Var) {
        let value = &mut self.activity[var.index()];
        value.0 += self.bump;
        if value.0 >= Self::rescale_limit() {
            self.rescale();
        }
        if let Some(pos) = self.position[var.index()] {
            self.sift_up(pos);
        }
    }

    /// Decay all activities.
    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
        if self.bump >= Self::rescale_limit() {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        let rescale_factor = 1.0 / Self::rescale_limit();
        for activity in &mut self.activity {
            activity.0 *= rescale_factor;
        }
        self.bump *= rescale_factor;
    }

    /// Insert a variable into the heap unless it is already present.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var.index()].is_none() {
            let pos = self.heap.len();
            self.position[var.index()] = Some(pos);
            self.heap.push(var);
            self.sift_up(pos);
        }
    }

    /// Remove and return the most active variable for which `is_free` holds.
    ///
    /// Variables popped on the way are dropped from the heap. They are assigned and become
    /// available again on backtracking.
    pub fn pop_available(&mut self, mut is_free: impl FnMut(Var) -> bool) -> Option<Var> {
        while let Some(var) = self.pop() {
            if is_free(var) {
                return Some(var);
            }
        }
        None
    }

    fn pop(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            return None;
        }
        let var = self.heap.swap_remove(0);
        self.position[var.index()] = None;
        if let Some(&top) = self.heap.first() {
            self.position[top.index()] = Some(0);
            self.sift_down(0);
        }
        Some(var)
    }

    /// Restore the heap property and positions for the whole heap.
    fn rebuild(&mut self) {
        for position in self.position.iter_mut() {
            *position = None;
        }
        for (pos, &var) in self.heap.iter().enumerate() {
            self.position[var.index()] = Some(pos);
        }
        for pos in (0..self.heap.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position[self.heap[a].index()] = Some(a);
        self.position[self.heap[b].index()] = Some(b);
    }

    fn more_active(&self, a: usize, b: usize) -> bool {
        self.activity[self.heap[a].index()] > self.activity[self.heap[b].index()]
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.more_active(pos, parent) {
                return;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut largest = pos;
            for child in [pos * 2 + 1, pos * 2 + 2].iter().cloned() {
                if child < self.heap.len() && self.more_active(child, largest) {
                    largest = child;
                }
            }
            if largest == pos {
                return;
            }
            self.swap(pos, largest);
            pos = largest;
        }
    }
}
