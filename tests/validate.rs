use automata_engine::{
    automaton::{
        AutBuild, InitializedAutomaton, Language, Validate,
        dfa::DFA,
        nfa::{NFA, NfaEdge},
        state::StateNode,
    },
    error::AutomatonError,
};

#[test]
fn dfa_without_initial_state() {
    let mut dfa = DFA::<u32, char>::new(vec!['a']);
    let q0 = dfa.add_state(StateNode::accepting(0));
    dfa.add_transition(q0, q0, 'a');

    assert!(matches!(
        dfa.validate(),
        Err(AutomatonError::InitialState { .. })
    ));

    // structural failures propagate through try_accepts, but accepts
    // collapses them to a plain negative
    assert!(matches!(
        dfa.try_accepts(&['a']),
        Err(AutomatonError::InitialState { .. })
    ));
    assert!(!dfa.accepts(&['a']));
}

#[test]
fn dfa_with_undeclared_edge_label() {
    let mut dfa = DFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = dfa.add_state(StateNode::accepting(0));
    dfa.set_initial(q0);

    dfa.add_transition(q0, q0, 'a');
    dfa.add_transition(q0, q0, 'b');
    dfa.add_transition(q0, q0, 'c');

    assert!(matches!(
        dfa.validate(),
        Err(AutomatonError::InvalidSymbol { .. })
    ));
}

#[test]
fn dfa_with_ambiguous_transition() {
    let mut dfa = DFA::<u32, char>::new(vec!['a']);
    let q0 = dfa.add_state(StateNode::non_accepting(0));
    let q1 = dfa.add_state(StateNode::accepting(1));
    dfa.set_initial(q0);

    dfa.add_transition(q0, q0, 'a');
    dfa.add_transition(q0, q1, 'a');
    dfa.add_transition(q1, q1, 'a');

    assert!(matches!(
        dfa.validate(),
        Err(AutomatonError::DeterminismViolation { .. })
    ));
}

#[test]
fn dfa_with_stateless_row() {
    // q1 is reachable but absent from the transition function entirely
    let mut dfa = DFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = dfa.add_state(StateNode::non_accepting(0));
    let q1 = dfa.add_state(StateNode::accepting(1));
    dfa.set_initial(q0);

    dfa.add_transition(q0, q1, 'a');
    dfa.add_transition(q0, q0, 'b');

    let Err(AutomatonError::MissingState { state }) = dfa.validate() else {
        panic!("expected a missing state");
    };
    assert_eq!(state, q1);
}

#[test]
fn dfa_missing_transition_names_state_and_symbol() {
    let mut dfa = DFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = dfa.add_state(StateNode::non_accepting(0));
    let q1 = dfa.add_state(StateNode::accepting(1));
    dfa.set_initial(q0);

    dfa.add_transition(q0, q1, 'a');
    dfa.add_transition(q0, q0, 'b');
    dfa.add_transition(q1, q1, 'a');

    let Err(AutomatonError::MissingSymbol { state, symbol }) = dfa.validate() else {
        panic!("expected a missing transition");
    };
    assert_eq!(state, q1);
    assert_eq!(symbol, "'b'");
}

#[test]
fn dfa_ignores_unreachable_holes() {
    // the unreachable q1 has no transitions; validation only judges the
    // reachable part
    let mut dfa = DFA::<u32, char>::new(vec!['a']);
    let q0 = dfa.add_state(StateNode::accepting(0));
    let _q1 = dfa.add_state(StateNode::non_accepting(1));
    dfa.set_initial(q0);

    dfa.add_transition(q0, q0, 'a');

    assert!(dfa.validate().is_ok());
}

#[test]
fn dfa_with_removed_initial_state() {
    let mut dfa = DFA::<u32, char>::new(vec!['a']);
    let q0 = dfa.add_state(StateNode::accepting(0));
    let q1 = dfa.add_state(StateNode::non_accepting(1));
    dfa.add_transition(q0, q0, 'a');
    dfa.set_initial(q1);

    // the initial state no longer names a live node after removal
    dfa.graph.remove_node(q1);

    assert!(matches!(
        dfa.validate(),
        Err(AutomatonError::InvalidState { .. })
    ));
}

#[test]
fn nfa_without_initial_state() {
    let mut nfa = NFA::<u32, char>::new(vec!['a']);
    let q0 = nfa.add_state(StateNode::accepting(0));
    nfa.add_transition(q0, q0, NfaEdge::Symbol('a'));

    assert!(matches!(
        nfa.validate(),
        Err(AutomatonError::InitialState { .. })
    ));
}

#[test]
fn nfa_with_undeclared_edge_label() {
    let mut nfa = NFA::<u32, char>::new(vec!['a']);
    let q0 = nfa.add_state(StateNode::accepting(0));
    nfa.set_initial(q0);

    nfa.add_transition(q0, q0, NfaEdge::Symbol('b'));

    assert!(matches!(
        nfa.validate(),
        Err(AutomatonError::InvalidSymbol { .. })
    ));
}

#[test]
fn nfa_allows_partial_and_ambiguous_tables() {
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::accepting(1));
    nfa.set_initial(q0);

    // two `a` successors and no `b` entry at all
    nfa.add_transition(q0, q0, NfaEdge::Symbol('a'));
    nfa.add_transition(q0, q1, NfaEdge::Symbol('a'));

    assert!(nfa.validate().is_ok());
}

#[test]
fn validation_is_idempotent() {
    let mut dfa = DFA::<u32, char>::new(vec!['a']);
    let q0 = dfa.add_state(StateNode::accepting(0));
    dfa.set_initial(q0);
    dfa.add_transition(q0, q0, 'a');

    let edge_count = dfa.graph.edge_count();
    let state_count = dfa.state_count();

    assert!(dfa.validate().is_ok());
    assert!(dfa.validate().is_ok());

    // no side effects on the description
    assert_eq!(dfa.graph.edge_count(), edge_count);
    assert_eq!(dfa.state_count(), state_count);
}
