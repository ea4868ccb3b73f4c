use serde::{Deserialize, Serialize};

use crate::automaton::AutomatonNode;

/// A state of an automaton.
/// It contains some caller data of type `N`, a boolean flag indicating whether
/// the state is accepting, and a boolean flag indicating whether the state is
/// a trap state.
///
/// Invariant: A state cannot be both accepting and a trap state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateNode<N: AutomatonNode> {
    pub accepting: bool,
    /// Whether the state is a trap state. Meaning from it there is no way to
    /// reach an accepting state. When it's unknown whether it's a trap
    /// state, this is set to false.
    pub trap: bool,
    pub data: N,
}

impl<N: AutomatonNode> StateNode<N> {
    pub fn new(accepting: bool, trap: bool, data: N) -> Self {
        assert!(
            !(accepting && trap),
            "A state cannot be both accepting and a trap state"
        );
        StateNode {
            accepting,
            trap,
            data,
        }
    }

    pub fn accepting(data: N) -> Self {
        StateNode::new(true, false, data)
    }

    pub fn non_accepting(data: N) -> Self {
        StateNode::new(false, false, data)
    }

    pub fn data(&self) -> &N {
        &self.data
    }

    pub fn invert_mut(&mut self) {
        self.accepting = !self.accepting;
        self.trap = false;
    }

    /// Joins two states into one, keeping the left data. The joined state
    /// accepts iff both sides accept.
    pub fn join_left<NO: AutomatonNode>(&self, other: &StateNode<NO>) -> StateNode<N> {
        StateNode::new(
            self.accepting && other.accepting,
            self.trap || other.trap,
            self.data.clone(),
        )
    }
}

impl<N: Default + AutomatonNode> Default for StateNode<N> {
    fn default() -> Self {
        StateNode::new(false, false, N::default())
    }
}
