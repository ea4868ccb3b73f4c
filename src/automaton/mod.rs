use std::{fmt::Debug, hash::Hash};

use petgraph::graph::NodeIndex;

use crate::error::AutomatonError;

pub mod dfa;
pub mod dpda;
pub mod dtm;
pub mod index_map;
pub mod nfa;
pub mod state;

/// This trait represents types that can be used as state data in an automaton.
pub trait AutomatonNode: Debug + Clone + PartialEq + Eq + Hash {}
impl<T> AutomatonNode for T where T: Debug + Clone + PartialEq + Eq + Hash {}

/// This trait represents types that can be used as symbols of an alphabet.
pub trait Letter: Debug + Clone + PartialEq + Eq + Hash + Ord {}
impl<T: Debug + Clone + PartialEq + Eq + Hash + Ord> Letter for T {}

/// Anything that declares an input alphabet.
pub trait Alphabet {
    type Letter: Letter;

    fn alphabet(&self) -> &[Self::Letter];

    fn contains_letter(&self, letter: &Self::Letter) -> bool {
        self.alphabet().contains(letter)
    }
}

/// Incremental construction of an automaton out of states and transitions.
pub trait AutBuild<NIndex, EIndex, N, E> {
    /// Adds a new state with the given data to the automaton.
    /// Returns the index of the newly added state.
    fn add_state(&mut self, data: N) -> NIndex;

    /// Adds a new transition from the given state to the given state with the
    /// given label. Returns the index of the newly added transition.
    ///
    /// Conflicting transitions are not rejected here. The [Validate] contract
    /// reports them as [AutomatonError::DeterminismViolation] for the
    /// deterministic variants.
    fn add_transition(&mut self, from: NIndex, to: NIndex, label: E) -> EIndex;
}

/// Structural validation shared by every automaton variant.
///
/// Checks run in a fixed order and fail fast on the first violation: initial
/// state membership, transition labels against the declared alphabets,
/// determinism, totality where the variant requires it, and variant-specific
/// extras (stack and tape alphabets). Validation is idempotent, has no side
/// effects, and never auto-corrects a description.
pub trait Validate {
    fn validate(&self) -> Result<(), AutomatonError>;
}

/// Access to the distinguished states of an automaton.
pub trait InitializedAutomaton {
    /// Returns the initial state of the automaton, panicking if no initial
    /// state is set.
    fn get_initial(&self) -> NodeIndex;
    /// Sets the initial state of the automaton.
    fn set_initial(&mut self, state: NodeIndex);

    /// Returns true if the passed in state is accepting / a final state.
    fn is_accepting(&self, state: NodeIndex) -> bool;
    /// Marks the passed in state as accepting / a final state.
    fn set_accepting(&mut self, state: NodeIndex);
}

/// The basic trait for anything that defines a language over a set alphabet.
pub trait Language: Alphabet {
    /// Checks whether the automaton accepts the given input.
    ///
    /// Structural validation failures of the description itself propagate as
    /// errors; execution failures (rejection, undeclared input symbol)
    /// collapse to `Ok(false)`, since a word outside the language is a
    /// legitimate negative result.
    fn try_accepts(&self, input: &[Self::Letter]) -> Result<bool, AutomatonError>;

    /// [Language::try_accepts] with every failure collapsed to `false`.
    fn accepts(&self, input: &[Self::Letter]) -> bool {
        self.try_accepts(input).unwrap_or(false)
    }
}

/// Phase marker for the lazy run iterators. Every run yields its initial
/// configuration before consuming any input and is non-restartable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Initial,
    Stepping,
    Done,
}
