use automata_engine::{
    automaton::{
        AutBuild, InitializedAutomaton, Language, Validate,
        dpda::{DPDA, PdaAcceptance, PdaEdge},
        state::StateNode,
    },
    error::AutomatonError,
};
use itertools::Itertools;

/// `aⁿbⁿ` for `n ≥ 1`, accepting by final state.
fn anbn_dpda() -> DPDA<u32, char, char> {
    let mut dpda = DPDA::<u32, char, char>::new(vec!['a', 'b'], vec!['Z', 'A'], 'Z');
    let q0 = dpda.add_state(StateNode::non_accepting(0));
    let q1 = dpda.add_state(StateNode::non_accepting(1));
    let q2 = dpda.add_state(StateNode::accepting(2));
    dpda.set_initial(q0);

    dpda.add_transition(q0, q0, PdaEdge::reading('a', 'Z', vec!['Z', 'A']));
    dpda.add_transition(q0, q0, PdaEdge::reading('a', 'A', vec!['A', 'A']));
    dpda.add_transition(q0, q1, PdaEdge::reading('b', 'A', vec![]));
    dpda.add_transition(q1, q1, PdaEdge::reading('b', 'A', vec![]));
    dpda.add_transition(q1, q2, PdaEdge::epsilon('Z', vec!['Z']));

    dpda
}

#[test]
fn test_dpda() {
    let dpda = anbn_dpda();
    assert!(dpda.validate().is_ok());

    assert!(dpda.accepts(&['a', 'b']));
    assert!(dpda.accepts(&['a', 'a', 'b', 'b']));
    assert!(dpda.accepts(&['a', 'a', 'a', 'b', 'b', 'b']));

    assert!(!dpda.accepts(&[]));
    assert!(!dpda.accepts(&['a']));
    assert!(!dpda.accepts(&['a', 'a', 'b']));
    assert!(!dpda.accepts(&['a', 'b', 'b']));
    assert!(!dpda.accepts(&['b', 'a']));
}

#[test]
fn test_dpda_stack_snapshots() {
    let dpda = anbn_dpda();

    // one pop matches one push, so after `ab` the stack holds exactly the
    // initial stack symbol again
    let input = ['a', 'b'];
    let configurations = dpda
        .execute(&input)
        .unwrap()
        .map(|step| step.unwrap())
        .collect_vec();

    let stacks = configurations
        .iter()
        .map(|configuration| configuration.stack.clone())
        .collect_vec();
    assert_eq!(
        stacks,
        vec![vec!['Z'], vec!['Z', 'A'], vec!['Z'], vec!['Z']]
    );

    let last = configurations.last().unwrap();
    assert_eq!(last.stack, vec![*dpda.initial_stack_symbol()]);
    assert_eq!(last.stack_top(), Some(&'Z'));
    assert!(dpda.is_accepting(last.state));
}

#[test]
fn test_dpda_pending_push_rejects() {
    let dpda = anbn_dpda();

    // `aab` leaves one pending `A` that is never popped
    let input = ['a', 'a', 'b'];
    let steps = dpda.execute(&input).unwrap().collect_vec();

    let (rejection, configurations) = steps.split_last().unwrap();
    assert!(matches!(
        rejection,
        Err(AutomatonError::Rejection { .. })
    ));

    let last = configurations.last().unwrap().as_ref().unwrap();
    assert_eq!(last.stack, vec!['Z', 'A']);
}

#[test]
fn test_dpda_empty_stack_acceptance() {
    // no accepting states; the caller selects acceptance by emptied stack
    let mut dpda = DPDA::<u32, char, char>::new(vec!['a'], vec!['Z'], 'Z');
    let q0 = dpda.add_state(StateNode::non_accepting(0));
    dpda.set_initial(q0);
    dpda.set_acceptance(PdaAcceptance::EmptyStack);

    dpda.add_transition(q0, q0, PdaEdge::reading('a', 'Z', vec![]));

    assert!(dpda.accepts(&['a']));
    assert!(!dpda.accepts(&[]));
    // the stack is already empty when the second symbol arrives
    assert!(!dpda.accepts(&['a', 'a']));
}

#[test]
fn test_dpda_epsilon_symbol_conflict() {
    let mut dpda = anbn_dpda();
    let q0 = dpda.get_start().unwrap();
    let q2 = dpda
        .graph
        .node_indices()
        .find(|state| dpda.is_accepting(*state))
        .unwrap();

    // an epsilon transition next to the symbol transition for (q0, Z)
    dpda.add_transition(q0, q2, PdaEdge::epsilon('Z', vec!['Z']));

    assert!(matches!(
        dpda.validate(),
        Err(AutomatonError::DeterminismViolation { .. })
    ));
    // execution refuses the description instead of guessing a priority
    assert!(matches!(
        dpda.execute(&['a', 'b']),
        Err(AutomatonError::DeterminismViolation { .. })
    ));
}

#[test]
fn test_dpda_duplicate_trigger() {
    let mut dpda = anbn_dpda();
    let q0 = dpda.get_start().unwrap();

    dpda.add_transition(q0, q0, PdaEdge::reading('a', 'Z', vec!['Z']));

    assert!(matches!(
        dpda.validate(),
        Err(AutomatonError::DeterminismViolation { .. })
    ));
}

#[test]
fn test_dpda_initial_stack_symbol_not_declared() {
    let mut dpda = DPDA::<u32, char, char>::new(vec!['a'], vec!['Z'], 'X');
    let q0 = dpda.add_state(StateNode::non_accepting(0));
    dpda.set_initial(q0);

    assert!(matches!(
        dpda.validate(),
        Err(AutomatonError::InitialState { .. })
    ));
}

#[test]
fn test_dpda_undeclared_stack_symbol() {
    let mut dpda = DPDA::<u32, char, char>::new(vec!['a'], vec!['Z'], 'Z');
    let q0 = dpda.add_state(StateNode::non_accepting(0));
    dpda.set_initial(q0);

    dpda.add_transition(q0, q0, PdaEdge::reading('a', 'Z', vec!['B']));

    assert!(matches!(
        dpda.validate(),
        Err(AutomatonError::InvalidSymbol { .. })
    ));
}

#[test]
fn test_dpda_json_roundtrip() {
    let dpda = anbn_dpda();

    let json = dpda.to_json().unwrap();
    let decoded = DPDA::<u32, char, char>::from_json(&json).unwrap();

    assert_eq!(decoded.state_count(), dpda.state_count());
    assert_eq!(decoded.stack_alphabet(), dpda.stack_alphabet());
    assert_eq!(decoded.initial_stack_symbol(), dpda.initial_stack_symbol());
    assert_eq!(decoded.acceptance(), dpda.acceptance());
    assert!(decoded.accepts(&['a', 'b']));
    assert!(!decoded.accepts(&['a', 'a', 'b']));
}
