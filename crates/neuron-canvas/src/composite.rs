//! Editing of composite layers: steps of a `sequential` block, branches of a `parallel` block.
//!
//! Each operation is one committed mutation. A missing layer, a layer of the wrong kind or an
//! out-of-range index leaves the store unchanged.

use crate::factory::{create_branch, create_layer};
use crate::model::{Layer, LayerKind, LayerType, ParallelBranch};
use crate::store::SandboxStore;

fn steps_mut(layer: &mut Layer) -> Option<&mut Vec<Layer>> {
    match &mut layer.kind {
        LayerKind::Sequential { steps } => Some(steps),
        _ => None,
    }
}

fn branches_mut(layer: &mut Layer) -> Option<&mut Vec<ParallelBranch>> {
    match &mut layer.kind {
        LayerKind::Parallel { branches } => Some(branches),
        _ => None,
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

impl SandboxStore {
    /// Appends a new default layer of `step_type` to a sequential block; returns the step id.
    pub fn add_sequential_step(&mut self, id: &str, step_type: LayerType) -> Option<String> {
        let step = create_layer(step_type);
        let step_id = step.id.clone();
        self.modify_layer(id, "add_sequential_step", |layer| match steps_mut(layer) {
            Some(steps) => {
                steps.push(step);
                true
            }
            None => false,
        })
        .then_some(step_id)
    }

    pub fn remove_sequential_step(&mut self, id: &str, index: usize) -> bool {
        self.modify_layer(id, "remove_sequential_step", |layer| {
            match steps_mut(layer) {
                Some(steps) if index < steps.len() => {
                    steps.remove(index);
                    true
                }
                _ => false,
            }
        })
    }

    pub fn reorder_sequential_step(&mut self, id: &str, from: usize, to: usize) -> bool {
        self.modify_layer(id, "reorder_sequential_step", |layer| {
            steps_mut(layer).is_some_and(|steps| move_item(steps, from, to))
        })
    }

    /// Appends an empty branch named after its position; returns the branch id.
    pub fn add_parallel_branch(&mut self, id: &str) -> Option<String> {
        let mut added = None;
        self.modify_layer(id, "add_parallel_branch", |layer| match branches_mut(layer) {
            Some(branches) => {
                let branch = create_branch(branches.len());
                added = Some(branch.id.clone());
                branches.push(branch);
                true
            }
            None => false,
        });
        added
    }

    pub fn remove_parallel_branch(&mut self, id: &str, branch: usize) -> bool {
        self.modify_layer(id, "remove_parallel_branch", |layer| {
            match branches_mut(layer) {
                Some(branches) if branch < branches.len() => {
                    branches.remove(branch);
                    true
                }
                _ => false,
            }
        })
    }

    pub fn rename_parallel_branch(&mut self, id: &str, branch: usize, name: &str) -> bool {
        self.modify_layer(id, "rename_parallel_branch", |layer| {
            match branches_mut(layer).and_then(|b| b.get_mut(branch)) {
                Some(b) if b.name != name => {
                    b.name = name.to_string();
                    true
                }
                _ => false,
            }
        })
    }

    pub fn add_branch_step(
        &mut self,
        id: &str,
        branch: usize,
        step_type: LayerType,
    ) -> Option<String> {
        let step = create_layer(step_type);
        let step_id = step.id.clone();
        self.modify_layer(id, "add_branch_step", |layer| {
            match branches_mut(layer).and_then(|b| b.get_mut(branch)) {
                Some(b) => {
                    b.steps.push(step);
                    true
                }
                None => false,
            }
        })
        .then_some(step_id)
    }

    pub fn remove_branch_step(&mut self, id: &str, branch: usize, index: usize) -> bool {
        self.modify_layer(id, "remove_branch_step", |layer| {
            match branches_mut(layer).and_then(|b| b.get_mut(branch)) {
                Some(b) if index < b.steps.len() => {
                    b.steps.remove(index);
                    true
                }
                _ => false,
            }
        })
    }

    pub fn reorder_branch_step(&mut self, id: &str, branch: usize, from: usize, to: usize) -> bool {
        self.modify_layer(id, "reorder_branch_step", |layer| {
            branches_mut(layer)
                .and_then(|b| b.get_mut(branch))
                .is_some_and(|b| move_item(&mut b.steps, from, to))
        })
    }
}
