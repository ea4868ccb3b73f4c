use std::slice;

use hashbrown::HashMap;
use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    automaton::{
        Alphabet, AutBuild, AutomatonNode, InitializedAutomaton, Language, Letter, RunPhase,
        Validate,
        dfa::DFA,
        state::StateNode,
    },
    error::AutomatonError,
};

/// A transition label of an [NFA]: either a consumed symbol or the empty
/// string. Epsilon is a label variant, not an alphabet member, so the
/// deterministic variants cannot express it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NfaEdge<S: Letter> {
    Symbol(S),
    Epsilon,
}

impl<S: Letter> NfaEdge<S> {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, NfaEdge::Epsilon)
    }

    /// Checks whether this label consumes the given letter.
    /// Epsilon never matches a letter.
    pub fn matches(&self, letter: &S) -> bool {
        match self {
            NfaEdge::Symbol(symbol) => symbol == letter,
            NfaEdge::Epsilon => false,
        }
    }
}

/// A non-deterministic finite automaton over the alphabet `S`, with epsilon
/// transitions. Execution tracks a set of live states; the transition table
/// may be partial and ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NFA<N: AutomatonNode, S: Letter> {
    start: Option<NodeIndex>,
    pub graph: DiGraph<StateNode<N>, NfaEdge<S>>,
    alphabet: Vec<S>,
}

impl<N: AutomatonNode, S: Letter> NFA<N, S> {
    pub fn new(alphabet: Vec<S>) -> Self {
        NFA {
            alphabet,
            start: None,
            graph: DiGraph::new(),
        }
    }

    pub fn get_start(&self) -> Option<NodeIndex> {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Extends a set of states to its epsilon closure: the smallest superset
    /// closed under following epsilon transitions, computed by a fixed-point
    /// worklist that settles every state once. The result is sorted and
    /// duplicate free, so equal closures compare equal.
    pub fn epsilon_closure(&self, states: &mut Vec<NodeIndex>) {
        let mut stack = states.clone();

        while let Some(state) = stack.pop() {
            for edge in self.graph.edges_directed(state, Direction::Outgoing) {
                if edge.weight().is_epsilon() {
                    let target = edge.target();

                    if !states.contains(&target) {
                        states.push(target);
                        stack.push(target);
                    }
                }
            }
        }

        states.sort();
        states.dedup();
    }

    /// The union of the transition images of every state in the set under
    /// the given symbol. Not epsilon-closed; callers close the result.
    pub fn symbol_image(&self, states: &[NodeIndex], symbol: &S) -> Vec<NodeIndex> {
        let mut image = vec![];

        for &state in states {
            for edge in self.graph.edges_directed(state, Direction::Outgoing) {
                if edge.weight().matches(symbol) {
                    image.push(edge.target());
                }
            }
        }

        image
    }

    /// Checks if a set of states contains an accepting state.
    pub fn is_accepting_set(&self, states: &[NodeIndex]) -> bool {
        states.iter().any(|&state| self.is_accepting(state))
    }

    /// Creates a DFA state from a set of NFA states. The empty set is the
    /// trap of the determinized automaton.
    fn state_from_set(&self, states: &[NodeIndex]) -> StateNode<()> {
        StateNode::new(self.is_accepting_set(states), states.is_empty(), ())
    }

    /// Determinizes the NFA to an equivalent DFA by subset construction.
    ///
    /// Each reachable, epsilon-closed subset of NFA states is interned as one
    /// fresh DFA state through a canonical lookup, starting from the closure
    /// of the initial state. The empty subset becomes an ordinary trap state
    /// when some image is empty, so the output is total. A subset state
    /// accepts iff it contains an accepting NFA state. Terminates because at
    /// most `2^n` distinct subsets exist.
    pub fn determinize(&self) -> Result<DFA<(), S>, AutomatonError> {
        self.validate()?;

        let start = self.start.expect("validated NFA has an initial state");
        let mut state_map: HashMap<Vec<NodeIndex>, NodeIndex> = HashMap::new();

        let mut dfa = DFA::<(), S>::new(self.alphabet.clone());

        let mut start_set = vec![start];
        self.epsilon_closure(&mut start_set);
        let dfa_start = dfa.add_state(self.state_from_set(&start_set));
        dfa.set_initial(dfa_start);
        state_map.insert(start_set.clone(), dfa_start);

        let mut stack = vec![start_set];

        while let Some(subset) = stack.pop() {
            let from = state_map[&subset];

            for symbol in &self.alphabet {
                let mut target = self.symbol_image(&subset, symbol);
                self.epsilon_closure(&mut target);

                let to = if let Some(&existing) = state_map.get(&target) {
                    existing
                } else {
                    let new_state = dfa.add_state(self.state_from_set(&target));
                    state_map.insert(target.clone(), new_state);
                    stack.push(target);
                    new_state
                };

                dfa.add_transition(from, to, symbol.clone());
            }
        }

        debug!(
            "subset construction produced {} DFA states from {} NFA states",
            dfa.state_count(),
            self.graph.node_count()
        );

        Ok(dfa)
    }

    /// Starts a stepwise run over `input`.
    ///
    /// Each configuration is the epsilon closure of the states reachable
    /// after the consumed prefix; the initial configuration is the closure of
    /// the initial state. The live set may become empty mid-run and keeps
    /// stepping; rejection is only reported once the whole input is consumed,
    /// since other inputs are not judged by their prefixes.
    pub fn execute<'a>(&'a self, input: &'a [S]) -> Result<NfaRun<'a, N, S>, AutomatonError> {
        self.validate()?;

        if let Some(symbol) = input.iter().find(|symbol| !self.contains_letter(symbol)) {
            return Err(AutomatonError::invalid_symbol(symbol));
        }

        let mut current = vec![self.start.expect("validated NFA has an initial state")];
        self.epsilon_closure(&mut current);

        Ok(NfaRun {
            nfa: self,
            input: input.iter(),
            current,
            phase: RunPhase::Initial,
        })
    }
}

impl<N, S> NFA<N, S>
where
    N: AutomatonNode + Serialize + DeserializeOwned,
    S: Letter + Serialize + DeserializeOwned,
{
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_file(&self, path: &str) -> anyhow::Result<()> {
        Ok(std::fs::write(path, self.to_json()?)?)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl<N: AutomatonNode, S: Letter> Validate for NFA<N, S> {
    fn validate(&self) -> Result<(), AutomatonError> {
        let start = self
            .start
            .ok_or_else(|| AutomatonError::initial_state("no initial state set"))?;
        if self.graph.node_weight(start).is_none() {
            return Err(AutomatonError::InvalidState { state: start });
        }

        for edge in self.graph.edge_references() {
            if let NfaEdge::Symbol(symbol) = edge.weight()
                && !self.alphabet.contains(symbol)
            {
                return Err(AutomatonError::invalid_symbol(symbol));
            }
        }

        Ok(())
    }
}

impl<N: AutomatonNode, S: Letter> Alphabet for NFA<N, S> {
    type Letter = S;

    fn alphabet(&self) -> &[S] {
        self.alphabet.as_slice()
    }
}

impl<N: AutomatonNode, S: Letter> AutBuild<NodeIndex, EdgeIndex, StateNode<N>, NfaEdge<S>>
    for NFA<N, S>
{
    fn add_state(&mut self, data: StateNode<N>) -> NodeIndex {
        self.graph.add_node(data)
    }

    fn add_transition(&mut self, from: NodeIndex, to: NodeIndex, label: NfaEdge<S>) -> EdgeIndex {
        self.graph.add_edge(from, to, label)
    }
}

impl<N: AutomatonNode, S: Letter> InitializedAutomaton for NFA<N, S> {
    fn get_initial(&self) -> NodeIndex {
        self.start.expect("NFA must have an initial state")
    }

    fn set_initial(&mut self, state: NodeIndex) {
        self.start = Some(state);
    }

    fn is_accepting(&self, state: NodeIndex) -> bool {
        self.graph
            .node_weight(state)
            .map(|node| node.accepting)
            .expect("state should be part of the NFA")
    }

    fn set_accepting(&mut self, state: NodeIndex) {
        self.graph[state].accepting = true;
    }
}

impl<N: AutomatonNode, S: Letter> Language for NFA<N, S> {
    fn try_accepts(&self, input: &[S]) -> Result<bool, AutomatonError> {
        self.validate()?;

        let run = match self.execute(input) {
            Ok(run) => run,
            Err(_) => return Ok(false),
        };

        for step in run {
            if step.is_err() {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// One instantaneous configuration of an [NFA] run: the epsilon-closed set
/// of live states, sorted and duplicate free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfaConfiguration {
    pub states: Vec<NodeIndex>,
}

/// A lazy, finite, non-restartable stepwise run of an [NFA].
/// Created by [`NFA::execute`]. Every yielded configuration owns its state
/// set; retaining one across steps is safe.
pub struct NfaRun<'a, N: AutomatonNode, S: Letter> {
    nfa: &'a NFA<N, S>,
    input: slice::Iter<'a, S>,
    current: Vec<NodeIndex>,
    phase: RunPhase,
}

impl<N: AutomatonNode, S: Letter> Iterator for NfaRun<'_, N, S> {
    type Item = Result<NfaConfiguration, AutomatonError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            RunPhase::Initial => {
                self.phase = RunPhase::Stepping;
                Some(Ok(NfaConfiguration {
                    states: self.current.clone(),
                }))
            }
            RunPhase::Stepping => match self.input.next() {
                Some(symbol) => {
                    let mut next = self.nfa.symbol_image(&self.current, symbol);
                    self.nfa.epsilon_closure(&mut next);
                    self.current = next;

                    Some(Ok(NfaConfiguration {
                        states: self.current.clone(),
                    }))
                }
                None => {
                    self.phase = RunPhase::Done;
                    if self.nfa.is_accepting_set(&self.current) {
                        None
                    } else {
                        Some(Err(AutomatonError::rejection_set(self.current.clone())))
                    }
                }
            },
            RunPhase::Done => None,
        }
    }
}
