//! MCTS tree node representation.
//!
//! The tree alternates between two node kinds:
//! - [`StateNode`]: a reachable game state, owning the actions created at expansion
//! - [`ActionNode`]: a legal move at a state, owning the successor states it produced
//!
//! Because a ply includes a random opponent reply, one action can lead to
//! several successor states. Each action keeps its own map from canonical
//! snapshot to child, a local transposition table scoped to that action.

use std::collections::HashMap;
use std::hash::Hash;

/// Index of a state node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    pub const NONE: StateId = StateId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an action node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u32);

impl ActionId {
    pub const NONE: ActionId = ActionId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A game state in the search tree.
#[derive(Debug, Clone)]
pub struct StateNode<S> {
    /// Owning action node (NONE for root)
    pub parent: ActionId,

    /// Canonical snapshot of the board at this node
    pub snapshot: S,

    /// Whether the game is over at this state
    pub is_terminal: bool,

    /// Actions created at expansion, in legal-move order.
    /// Empty until the node is expanded.
    pub actions: Vec<ActionId>,

    /// Number of rollouts that passed through this node
    pub visit_count: u32,

    /// Sum of rewards backpropagated through this node
    pub value_sum: f32,
}

impl<S> StateNode<S> {
    /// Create a new root node.
    pub fn new_root(snapshot: S, is_terminal: bool) -> Self {
        Self::new_child(ActionId::NONE, snapshot, is_terminal)
    }

    /// Create a state node reached through `parent`.
    pub fn new_child(parent: ActionId, snapshot: S, is_terminal: bool) -> Self {
        Self {
            parent,
            snapshot,
            is_terminal,
            actions: Vec::new(),
            visit_count: 0,
            value_sum: 0.0,
        }
    }

    /// Mean reward V(s) = value_sum / visit_count.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        mean(self.value_sum, self.visit_count)
    }

    /// Check if this node has been expanded (has actions).
    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.actions.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A legal move at a state in the search tree.
#[derive(Debug, Clone)]
pub struct ActionNode<A, S> {
    /// Owning state node
    pub parent: StateId,

    /// Move identifier
    pub action: A,

    /// Successor states keyed by canonical snapshot
    pub children: HashMap<S, StateId>,

    /// Successor states in creation order
    pub child_order: Vec<StateId>,

    /// Number of rollouts that passed through this action
    pub visit_count: u32,

    /// Sum of rewards backpropagated through this action
    pub value_sum: f32,
}

impl<A, S: Eq + Hash> ActionNode<A, S> {
    pub fn new(parent: StateId, action: A) -> Self {
        Self {
            parent,
            action,
            children: HashMap::new(),
            child_order: Vec::new(),
            visit_count: 0,
            value_sum: 0.0,
        }
    }

    /// Mean reward Q(s,a) = value_sum / visit_count.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        mean(self.value_sum, self.visit_count)
    }

    /// Child reached when the ply produced `snapshot`, if already seen.
    #[inline]
    pub fn child(&self, snapshot: &S) -> Option<StateId> {
        self.children.get(snapshot).copied()
    }

    /// UCB1 priority of this action.
    ///
    /// `UCB1(s,a) = Q(s,a) + c * sqrt(ln N(s) / N(s,a))`, infinite while the
    /// action is unvisited. With `c = sqrt(2)` this is the classic
    /// `Q + sqrt(2 ln N / n)`.
    ///
    /// Takes pre-computed `ln(N(s))` so it is evaluated once per selection.
    #[inline]
    pub fn ucb1(&self, parent_visits_ln: f32, exploration: f32) -> f32 {
        if self.visit_count == 0 {
            return f32::INFINITY;
        }
        self.mean_value() + exploration * (parent_visits_ln / self.visit_count as f32).sqrt()
    }
}

#[inline]
fn mean(sum: f32, count: u32) -> f32 {
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}
