use std::fmt::Debug;

use petgraph::graph::NodeIndex;
use thiserror::Error;

/// Errors raised by validation and execution of automata.
///
/// Every validation failure names the offending state or symbol, so callers
/// can branch on cause instead of pattern matching message strings. Symbols
/// are stored in their [Debug] rendering because the symbol type is generic
/// while the error type is not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    #[error("state {state:?} is not part of the automaton")]
    InvalidState { state: NodeIndex },

    #[error("symbol {symbol} is not allowed by the declared alphabets")]
    InvalidSymbol { symbol: String },

    #[error("state {state:?} is missing from a required mapping")]
    MissingState { state: NodeIndex },

    #[error("state {state:?} has no transition for symbol {symbol}")]
    MissingSymbol { state: NodeIndex, symbol: String },

    #[error("invalid initial configuration: {reason}")]
    InitialState { reason: String },

    #[error("invalid final configuration: {reason}")]
    FinalState { reason: String },

    #[error("state {state:?} has multiple transitions enabled by {trigger}")]
    DeterminismViolation { state: NodeIndex, trigger: String },

    #[error("automaton halted in non-accepting configuration {states:?}")]
    Rejection { states: Vec<NodeIndex> },
}

impl AutomatonError {
    pub fn invalid_symbol(symbol: &impl Debug) -> Self {
        AutomatonError::InvalidSymbol {
            symbol: format!("{symbol:?}"),
        }
    }

    pub fn missing_symbol(state: NodeIndex, symbol: &impl Debug) -> Self {
        AutomatonError::MissingSymbol {
            state,
            symbol: format!("{symbol:?}"),
        }
    }

    pub fn initial_state(reason: impl Into<String>) -> Self {
        AutomatonError::InitialState {
            reason: reason.into(),
        }
    }

    pub fn final_state(reason: impl Into<String>) -> Self {
        AutomatonError::FinalState {
            reason: reason.into(),
        }
    }

    pub fn determinism_violation(state: NodeIndex, trigger: &impl Debug) -> Self {
        AutomatonError::DeterminismViolation {
            state,
            trigger: format!("{trigger:?}"),
        }
    }

    /// Rejection in a single-state configuration (DFA, DPDA, DTM).
    pub fn rejection(state: NodeIndex) -> Self {
        AutomatonError::Rejection {
            states: vec![state],
        }
    }

    /// Rejection in a set-of-states configuration (NFA).
    pub fn rejection_set(states: Vec<NodeIndex>) -> Self {
        AutomatonError::Rejection { states }
    }
}
