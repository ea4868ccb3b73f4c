use automata_engine::{
    automaton::{
        AutBuild, InitializedAutomaton, Language, Validate,
        nfa::{NFA, NfaEdge},
        state::StateNode,
    },
    error::AutomatonError,
    validation::same_language::assert_same_language,
};
use itertools::Itertools;

#[test]
fn test_nfa_to_dfa() {
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::non_accepting(1));
    let q2 = nfa.add_state(StateNode::accepting(2));

    nfa.set_initial(q0);

    nfa.add_transition(q0, q0, NfaEdge::Symbol('a'));
    nfa.add_transition(q0, q1, NfaEdge::Symbol('b'));

    nfa.add_transition(q1, q2, NfaEdge::Symbol('a'));
    nfa.add_transition(q2, q1, NfaEdge::Symbol('b'));

    nfa.add_transition(q1, q1, NfaEdge::Symbol('a'));
    nfa.add_transition(q1, q1, NfaEdge::Symbol('b'));

    nfa.add_transition(q2, q2, NfaEdge::Symbol('a'));
    nfa.add_transition(q2, q2, NfaEdge::Symbol('b'));

    let dfa = nfa.determinize().unwrap();

    assert!(dfa.validate().is_ok());
    assert_same_language(&nfa, &dfa, 6);
}

#[test]
fn test_nfa_to_dfa_2() {
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::non_accepting(1));
    let q2 = nfa.add_state(StateNode::accepting(2));

    nfa.set_initial(q0);

    nfa.add_transition(q0, q0, NfaEdge::Symbol('a'));
    nfa.add_transition(q0, q0, NfaEdge::Symbol('b'));

    nfa.add_transition(q0, q1, NfaEdge::Symbol('a'));
    nfa.add_transition(q1, q2, NfaEdge::Symbol('b'));

    let dfa = nfa.determinize().unwrap();

    assert!(dfa.validate().is_ok());
    assert_same_language(&nfa, &dfa, 6);
}

#[test]
fn test_nfa_to_dfa_epsilon() {
    // an NFA with epsilon transitions
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::non_accepting(1));
    let q2 = nfa.add_state(StateNode::non_accepting(2));
    let q3 = nfa.add_state(StateNode::non_accepting(3));
    let q4 = nfa.add_state(StateNode::accepting(4));

    nfa.set_initial(q0);

    nfa.add_transition(q0, q1, NfaEdge::Symbol('a'));
    nfa.add_transition(q0, q2, NfaEdge::Epsilon);

    nfa.add_transition(q1, q2, NfaEdge::Symbol('b'));

    nfa.add_transition(q2, q3, NfaEdge::Symbol('a'));
    nfa.add_transition(q2, q4, NfaEdge::Epsilon);

    nfa.add_transition(q3, q2, NfaEdge::Symbol('b'));

    let dfa = nfa.determinize().unwrap();

    assert!(dfa.validate().is_ok());
    assert_same_language(&nfa, &dfa, 6);
}

#[test]
fn test_epsilon_closure() {
    let mut nfa = NFA::<u32, char>::new(vec!['a']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::non_accepting(1));
    let q2 = nfa.add_state(StateNode::non_accepting(2));
    let q3 = nfa.add_state(StateNode::accepting(3));

    nfa.set_initial(q0);

    nfa.add_transition(q0, q1, NfaEdge::Epsilon);
    nfa.add_transition(q1, q2, NfaEdge::Epsilon);
    // the closure follows chains but not symbol transitions
    nfa.add_transition(q2, q3, NfaEdge::Symbol('a'));
    // cycles settle instead of looping
    nfa.add_transition(q2, q0, NfaEdge::Epsilon);

    let mut closure = vec![q0];
    nfa.epsilon_closure(&mut closure);
    assert_eq!(closure, vec![q0, q1, q2]);

    let mut closure = vec![q3];
    nfa.epsilon_closure(&mut closure);
    assert_eq!(closure, vec![q3]);
}

/// Strings starting and ending with `a`, with no consecutive `b`s.
fn a_star_nfa() -> NFA<u32, char> {
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::accepting(1));
    let q2 = nfa.add_state(StateNode::non_accepting(2));

    nfa.set_initial(q0);

    nfa.add_transition(q0, q1, NfaEdge::Symbol('a'));
    nfa.add_transition(q1, q1, NfaEdge::Symbol('a'));
    nfa.add_transition(q1, q2, NfaEdge::Epsilon);
    nfa.add_transition(q2, q0, NfaEdge::Symbol('b'));

    nfa
}

#[test]
fn test_nfa_acceptance() {
    let nfa = a_star_nfa();

    assert!(nfa.accepts(&['a', 'b', 'a']));
    assert!(!nfa.accepts(&['a', 'b', 'b', 'a']));
    assert!(nfa.accepts(&['a']));
    assert!(!nfa.accepts(&[]));
    assert!(!nfa.accepts(&['b']));
}

#[test]
fn test_nfa_execution_tracks_closures() {
    let nfa = a_star_nfa();
    let q0 = nfa.get_start().unwrap();
    let q1 = nfa
        .symbol_image(&[q0], &'a')
        .first()
        .copied()
        .unwrap();

    let input = ['a'];
    let configurations = nfa
        .execute(&input)
        .unwrap()
        .map(|step| step.unwrap().states)
        .collect_vec();

    // the initial configuration is the closure of the initial state; after
    // `a` the closure pulls in the epsilon successor of q1
    assert_eq!(configurations.len(), 2);
    assert_eq!(configurations[0], vec![q0]);
    assert!(configurations[1].contains(&q1));
    assert_eq!(configurations[1].len(), 2);
}

#[test]
fn test_nfa_no_early_rejection() {
    let nfa = a_star_nfa();

    // the live set empties after `abb` but the run keeps stepping; the
    // rejection arrives only once the whole input is consumed
    let input = ['a', 'b', 'b', 'a'];
    let steps = nfa.execute(&input).unwrap().collect_vec();

    assert_eq!(steps.len(), 6);
    assert!(steps[..5].iter().all(|step| step.is_ok()));
    assert_eq!(steps[3].as_ref().unwrap().states, vec![]);
    assert!(matches!(
        steps[5],
        Err(AutomatonError::Rejection { .. })
    ));
}

#[test]
fn test_determinize_is_complete() {
    // only the word "a" is accepted; the determinized DFA still has a
    // transition for every (state, symbol) pair via the empty-subset trap
    let mut nfa = NFA::<u32, char>::new(vec!['a', 'b']);
    let q0 = nfa.add_state(StateNode::non_accepting(0));
    let q1 = nfa.add_state(StateNode::accepting(1));
    nfa.set_initial(q0);
    nfa.add_transition(q0, q1, NfaEdge::Symbol('a'));

    let dfa = nfa.determinize().unwrap();

    assert!(dfa.validate().is_ok());
    assert!(dfa.accepts(&['a']));
    assert!(!dfa.accepts(&['b']));
    assert!(!dfa.accepts(&['a', 'a']));

    let trap_states = dfa
        .graph
        .node_indices()
        .filter(|state| dfa.graph[*state].trap)
        .collect_vec();
    assert_eq!(trap_states.len(), 1);
}

#[test]
fn test_nfa_json_roundtrip() {
    let nfa = a_star_nfa();

    let json = nfa.to_json().unwrap();
    let decoded = NFA::<u32, char>::from_json(&json).unwrap();

    assert_eq!(decoded.state_count(), nfa.state_count());
    assert_eq!(decoded.get_start(), nfa.get_start());
    assert_same_language(&nfa, &decoded, 6);
}
