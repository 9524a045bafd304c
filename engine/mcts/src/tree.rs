//! MCTS tree structure with arena allocation.
//!
//! State nodes and action nodes live in two contiguous Vecs and reference
//! each other by [`StateId`] / [`ActionId`] indices, so parent links never
//! form ownership cycles. The whole arena is dropped with the tree; nothing
//! survives from one search call to the next.

use std::fmt::{Debug, Write as _};
use std::hash::Hash;

use crate::node::{ActionId, ActionNode, StateId, StateNode};
use crate::search::SearchError;

/// Final statistics of one action, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionStats<A> {
    pub action: A,
    pub visit_count: u32,
    pub value_sum: f32,
    pub mean_value: f32,
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct SearchTree<A, S> {
    /// Arena storing all state nodes
    states: Vec<StateNode<S>>,

    /// Arena storing all action nodes
    actions: Vec<ActionNode<A, S>>,

    /// Root state index (always 0 after initialization)
    root: StateId,
}

impl<A, S> SearchTree<A, S>
where
    A: Copy + Debug,
    S: Copy + Eq + Hash + Debug,
{
    /// Create a new tree holding only the root state.
    pub fn new(root_snapshot: S, root_is_terminal: bool) -> Self {
        Self {
            states: vec![StateNode::new_root(root_snapshot, root_is_terminal)],
            actions: Vec::new(),
            root: StateId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> StateId {
        self.root
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &StateNode<S> {
        &self.states[id.index()]
    }

    #[inline]
    pub fn state_mut(&mut self, id: StateId) -> &mut StateNode<S> {
        &mut self.states[id.index()]
    }

    #[inline]
    pub fn action(&self, id: ActionId) -> &ActionNode<A, S> {
        &self.actions[id.index()]
    }

    #[inline]
    pub fn action_mut(&mut self, id: ActionId) -> &mut ActionNode<A, S> {
        &mut self.actions[id.index()]
    }

    /// Number of state nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of action nodes in the tree.
    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Create one action node per legal move under `state_id`.
    ///
    /// A state is expanded at most once. Expanding with no legal moves leaves
    /// the node unexpanded.
    pub fn expand(
        &mut self,
        state_id: StateId,
        legal_moves: impl IntoIterator<Item = A>,
    ) -> Result<(), SearchError> {
        if self.state(state_id).is_expanded() {
            return Err(SearchError::AlreadyExpanded(state_id));
        }

        let mut created = Vec::new();
        for action in legal_moves {
            let id = ActionId(self.actions.len() as u32);
            self.actions.push(ActionNode::new(state_id, action));
            created.push(id);
        }

        self.state_mut(state_id).actions = created;
        Ok(())
    }

    /// Select the action of `state_id` with the highest UCB1 priority.
    ///
    /// Unvisited actions come first. Ties go to the earliest action in
    /// expansion order, so selection is deterministic.
    pub fn select_action(&self, state_id: StateId, exploration: f32) -> Option<ActionId> {
        let node = self.state(state_id);
        // Pre-compute ln once instead of per-action comparison
        let parent_visits_ln = (node.visit_count.max(1) as f32).ln();

        let mut best: Option<(ActionId, f32)> = None;
        for &id in &node.actions {
            let score = self.action(id).ucb1(parent_visits_ln, exploration);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Register a new successor state under `action_id`.
    /// Returns the new state's ID.
    pub fn add_child(&mut self, action_id: ActionId, snapshot: S, is_terminal: bool) -> StateId {
        let child_id = StateId(self.states.len() as u32);
        self.states
            .push(StateNode::new_child(action_id, snapshot, is_terminal));

        let action = self.action_mut(action_id);
        action.children.insert(snapshot, child_id);
        action.child_order.push(child_id);

        child_id
    }

    /// Backpropagate a reward from a leaf state to the root.
    ///
    /// Every state and action on the path gets one visit and the same reward;
    /// the opponent is part of the environment, so the sign never flips.
    pub fn backpropagate(&mut self, leaf_id: StateId, reward: f32) {
        let mut current_id = leaf_id;

        loop {
            let node = self.state_mut(current_id);
            node.visit_count += 1;
            node.value_sum += reward;

            let parent = node.parent;
            if parent.is_none() {
                break;
            }

            let action = self.action_mut(parent);
            action.visit_count += 1;
            action.value_sum += reward;

            current_id = action.parent;
        }
    }

    /// Root action with the highest mean value.
    /// Ties go to the earliest action. Returns None if the root has no actions.
    pub fn best_action(&self) -> Option<ActionId> {
        let mut best: Option<(ActionId, f32)> = None;
        for &id in &self.state(self.root).actions {
            let value = self.action(id).mean_value();
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((id, value)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Statistics of one action node.
    pub fn action_stats(&self, id: ActionId) -> ActionStats<A> {
        let node = self.action(id);
        ActionStats {
            action: node.action,
            visit_count: node.visit_count,
            value_sum: node.value_sum,
            mean_value: node.mean_value(),
        }
    }

    /// Statistics of every root action, in expansion order.
    pub fn root_action_stats(&self) -> Vec<ActionStats<A>> {
        self.state(self.root)
            .actions
            .iter()
            .map(|&id| self.action_stats(id))
            .collect()
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.state(self.root);
        TreeStats {
            total_states: self.states.len(),
            total_actions: self.actions.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, state_id: StateId, current_depth: u32) -> u32 {
        self.state(state_id)
            .actions
            .iter()
            .flat_map(|&a| self.action(a).child_order.iter())
            .map(|&child| self.compute_max_depth(child, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }

    /// Dump with snapshots shown in their `Debug` form.
    pub fn dump(&self) -> String {
        self.dump_with(|snapshot| format!("{:?}", snapshot))
    }

    /// Human-readable dump of every state node, depth first.
    ///
    /// For each state: its ID, the rendered snapshot, visit count, cumulative
    /// reward, and the mean value of each of its actions.
    pub fn dump_with(&self, render: impl Fn(&S) -> String) -> String {
        let mut out = String::new();
        self.dump_state(self.root, &render, &mut out);
        out
    }

    fn dump_state(&self, id: StateId, render: &impl Fn(&S) -> String, out: &mut String) {
        let node = self.state(id);
        // Writing into a String cannot fail
        let _ = writeln!(out, "===== state {} =====", id.0);
        let _ = writeln!(out, "{}", render(&node.snapshot));
        let _ = writeln!(
            out,
            "visits={} reward={} terminal={}",
            node.visit_count, node.value_sum, node.is_terminal
        );
        for &a in &node.actions {
            let action = self.action(a);
            let _ = writeln!(
                out,
                "  action {:?}: visits={} value={:.4}",
                action.action,
                action.visit_count,
                action.mean_value()
            );
        }

        for &a in &node.actions {
            for &child in &self.action(a).child_order {
                self.dump_state(child, render, out);
            }
        }
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_states: usize,
    pub total_actions: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}
