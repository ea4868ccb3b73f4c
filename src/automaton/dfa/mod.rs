use std::{collections::VecDeque, fmt::Debug, slice};

use hashbrown::HashMap;
use itertools::Itertools;
use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    automaton::{
        Alphabet, AutBuild, AutomatonNode, InitializedAutomaton, Language, Letter, RunPhase,
        Validate,
        index_map::{IndexMap, IndexSet},
        nfa::{NFA, NfaEdge},
        state::StateNode,
    },
    error::AutomatonError,
};

pub mod minimization;

/// A deterministic finite automaton over the alphabet `S`.
///
/// States carry caller data of type `N`; transitions are labeled with the
/// consumed symbol. The description is built incrementally through
/// [AutBuild] and checked by [Validate]: every reachable state must have
/// exactly one transition per alphabet symbol.
#[derive(Clone, Serialize, Deserialize)]
pub struct DFA<N: AutomatonNode, S: Letter> {
    start: Option<NodeIndex>,
    pub graph: DiGraph<StateNode<N>, S>,
    alphabet: Vec<S>,
}

impl<N: AutomatonNode, S: Letter> DFA<N, S> {
    pub fn new(alphabet: Vec<S>) -> Self {
        DFA {
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

    /// The unique transition target for `(state, symbol)`, if one is defined.
    pub fn successor(&self, state: NodeIndex, symbol: &S) -> Option<NodeIndex> {
        self.graph
            .edges_directed(state, Direction::Outgoing)
            .find(|edge| edge.weight() == symbol)
            .map(|edge| edge.target())
    }

    /// All states reachable from the initial state by following transitions,
    /// in breadth-first discovery order. Empty when no initial state is set.
    pub fn reachable_states(&self) -> Vec<NodeIndex> {
        let Some(start) = self.start else {
            return vec![];
        };

        let mut visited = IndexSet::new(self.graph.node_count());
        let mut queue = VecDeque::new();
        let mut reachable = vec![];

        visited.insert(start);
        queue.push_back(start);

        while let Some(state) = queue.pop_front() {
            reachable.push(state);

            for edge in self.graph.edges_directed(state, Direction::Outgoing) {
                if visited.insert(edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }

        reachable
    }

    /// Adds a trap state if needed and routes every missing (state, symbol)
    /// pair to it. This turns a partial DFA into a total one, which the
    /// validation contract demands.
    pub fn make_complete(&mut self, data: N) -> Option<NodeIndex> {
        let mut missing = Vec::new();

        for state in self.graph.node_indices() {
            for symbol in self.alphabet.iter() {
                if self.successor(state, symbol).is_none() {
                    missing.push((state, symbol.clone()));
                }
            }
        }

        if missing.is_empty() {
            return None;
        }

        let trap = self.add_state(StateNode::new(false, true, data));

        for (state, symbol) in missing {
            self.add_transition(state, trap, symbol);
        }

        for symbol in self.alphabet.clone() {
            self.add_transition(trap, trap, symbol);
        }

        Some(trap)
    }

    /// Complements the accepted language, creating a new DFA where the
    /// accepting states are inverted.
    ///
    /// See [`DFA::invert_mut`] for a version that modifies the DFA in place.
    pub fn invert(&self) -> Result<DFA<N, S>, AutomatonError> {
        self.validate()?;

        let mut inverted = self.clone();
        for state in inverted.graph.node_indices() {
            inverted.graph[state].invert_mut();
        }

        Ok(inverted)
    }

    /// Complements the accepted language in place. The DFA must validate,
    /// otherwise the complement would judge missing transitions differently.
    pub fn invert_mut(&mut self) -> Result<(), AutomatonError> {
        self.validate()?;

        for state in self.graph.node_indices() {
            self.graph[state].invert_mut();
        }

        Ok(())
    }

    /// Builds the product DFA accepting `L(self) ∩ L(other)`. Both inputs
    /// must validate and declare the same alphabet.
    pub fn intersect<NO: AutomatonNode>(
        &self,
        other: &DFA<NO, S>,
    ) -> Result<DFA<N, S>, AutomatonError> {
        self.validate()?;
        other.validate()?;

        let mut self_alphabet = self.alphabet.clone();
        let mut other_alphabet = other.alphabet.clone();
        self_alphabet.sort();
        other_alphabet.sort();

        if self_alphabet != other_alphabet {
            let foreign = other_alphabet
                .iter()
                .find(|symbol| !self_alphabet.contains(symbol))
                .unwrap_or(&self_alphabet[0]);
            return Err(AutomatonError::invalid_symbol(foreign));
        }

        let self_start = self.start.expect("validated DFA has an initial state");
        let other_start = other.start.expect("validated DFA has an initial state");

        // state map to map combinations of states to the new product states
        let mut state_map = HashMap::new();
        let mut stack = vec![(self_start, other_start)];

        let mut product = DFA::new(self.alphabet.clone());

        let start_state =
            product.add_state(self.graph[self_start].join_left(&other.graph[other_start]));
        product.set_initial(start_state);
        state_map.insert((self_start, other_start), start_state);

        while let Some((state1, state2)) = stack.pop() {
            let from = state_map[&(state1, state2)];

            for edge1 in self.graph.edges_directed(state1, Direction::Outgoing) {
                for edge2 in other.graph.edges_directed(state2, Direction::Outgoing) {
                    if edge1.weight() == edge2.weight() {
                        let to = *state_map
                            .entry((edge1.target(), edge2.target()))
                            .or_insert_with(|| {
                                let new_state = product.add_state(
                                    self.graph[edge1.target()]
                                        .join_left(&other.graph[edge2.target()]),
                                );
                                stack.push((edge1.target(), edge2.target()));
                                new_state
                            });

                        product.add_transition(from, to, edge1.weight().clone());
                    }
                }
            }
        }

        Ok(product)
    }

    /// Checks if some accepting state is reachable from the initial state.
    pub fn has_accepting_run(&self) -> bool {
        self.reachable_states()
            .into_iter()
            .any(|state| self.graph[state].accepting)
    }

    /// Checks if `L(Self) = ∅`.
    pub fn is_language_empty(&self) -> bool {
        !self.has_accepting_run()
    }

    /// Checks if `L(Self) ⊆ L(Other)`. Both must validate and share an
    /// alphabet.
    ///
    /// The inclusion holds if there is no accepting run in the intersection
    /// of self and the complement of other.
    /// `L(Self) ⊆ L(Other) iff L(Self) ∩ L(invert(Other)) = ∅`
    pub fn is_subset_of<NO: AutomatonNode>(&self, other: &DFA<NO, S>) -> Result<bool, AutomatonError> {
        let inverted = other.invert()?;
        Ok(self.intersect(&inverted)?.is_language_empty())
    }

    /// Builds an NFA accepting the reversal of `L(self)`: a fresh start state
    /// is wired with epsilon transitions to the old accepting states, every
    /// transition is flipped, and the old initial state becomes accepting.
    pub fn reverse_nfa(&self) -> Result<NFA<(), S>, AutomatonError> {
        self.validate()?;

        let mut reversed = NFA::new(self.alphabet.clone());
        let start = reversed.add_state(StateNode::default());
        reversed.set_initial(start);

        let mut state_map = IndexMap::new(self.state_count());

        for state in self.graph.node_indices() {
            let new_state = reversed.add_state(StateNode::default());
            state_map.insert(state, new_state);

            if Some(state) == self.start {
                reversed.set_accepting(new_state);
            }

            if self.graph[state].accepting {
                reversed.add_transition(start, new_state, NfaEdge::Epsilon);
            }
        }

        for edge in self.graph.edge_references() {
            let source = state_map[edge.target()];
            let target = state_map[edge.source()];

            reversed.add_transition(source, target, NfaEdge::Symbol(edge.weight().clone()));
        }

        Ok(reversed)
    }

    /// The reversal of `L(self)` as a DFA, via [`DFA::reverse_nfa`] and
    /// subset construction.
    pub fn reverse(&self) -> Result<DFA<(), S>, AutomatonError> {
        self.reverse_nfa()?.determinize()
    }

    /// Starts a stepwise run over `input`.
    ///
    /// The description is validated and every input symbol checked against
    /// the alphabet before the first step. The returned iterator yields the
    /// initial configuration, then one configuration per consumed symbol;
    /// a run that halts non-accepting ends with
    /// [AutomatonError::Rejection] once the whole input was consumed. Each
    /// configuration is an independent value.
    pub fn execute<'a>(&'a self, input: &'a [S]) -> Result<DfaRun<'a, N, S>, AutomatonError> {
        self.validate()?;

        if let Some(symbol) = input.iter().find(|symbol| !self.contains_letter(symbol)) {
            return Err(AutomatonError::invalid_symbol(symbol));
        }

        Ok(DfaRun {
            dfa: self,
            input: input.iter(),
            current: self.start.expect("validated DFA has an initial state"),
            phase: RunPhase::Initial,
        })
    }
}

impl<N, S> DFA<N, S>
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

impl<N: AutomatonNode, S: Letter> Validate for DFA<N, S> {
    fn validate(&self) -> Result<(), AutomatonError> {
        let start = self
            .start
            .ok_or_else(|| AutomatonError::initial_state("no initial state set"))?;
        if self.graph.node_weight(start).is_none() {
            return Err(AutomatonError::InvalidState { state: start });
        }

        for edge in self.graph.edge_references() {
            if !self.alphabet.contains(edge.weight()) {
                return Err(AutomatonError::invalid_symbol(edge.weight()));
            }
        }

        // determinism and totality over every reachable state
        let mut visited = IndexSet::new(self.graph.node_count());
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(state) = queue.pop_front() {
            // a state with no outgoing transitions at all is missing from the
            // transition function, not just missing one symbol
            if !self.alphabet.is_empty()
                && self
                    .graph
                    .edges_directed(state, Direction::Outgoing)
                    .next()
                    .is_none()
            {
                return Err(AutomatonError::MissingState { state });
            }

            for symbol in self.alphabet.iter() {
                let mut matching = self
                    .graph
                    .edges_directed(state, Direction::Outgoing)
                    .filter(|edge| edge.weight() == symbol);

                let Some(edge) = matching.next() else {
                    return Err(AutomatonError::missing_symbol(state, symbol));
                };
                if matching.next().is_some() {
                    return Err(AutomatonError::determinism_violation(state, symbol));
                }

                if visited.insert(edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }

        Ok(())
    }
}

impl<N: AutomatonNode, S: Letter> Alphabet for DFA<N, S> {
    type Letter = S;

    fn alphabet(&self) -> &[S] {
        self.alphabet.as_slice()
    }
}

impl<N: AutomatonNode, S: Letter> AutBuild<NodeIndex, EdgeIndex, StateNode<N>, S> for DFA<N, S> {
    fn add_state(&mut self, data: StateNode<N>) -> NodeIndex {
        self.graph.add_node(data)
    }

    fn add_transition(&mut self, from: NodeIndex, to: NodeIndex, label: S) -> EdgeIndex {
        self.graph.add_edge(from, to, label)
    }
}

impl<N: AutomatonNode, S: Letter> InitializedAutomaton for DFA<N, S> {
    fn get_initial(&self) -> NodeIndex {
        self.start.expect("DFA must have an initial state")
    }

    fn set_initial(&mut self, state: NodeIndex) {
        self.start = Some(state);
    }

    fn is_accepting(&self, state: NodeIndex) -> bool {
        self.graph
            .node_weight(state)
            .map(|node| node.accepting)
            .expect("state should be part of the DFA")
    }

    fn set_accepting(&mut self, state: NodeIndex) {
        self.graph[state].accepting = true;
    }
}

impl<N: AutomatonNode, S: Letter> Language for DFA<N, S> {
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

impl<N: AutomatonNode, S: Letter> Debug for DFA<N, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DFA")
            .field("alphabet", &self.alphabet)
            .field("state_count", &self.graph.node_count())
            .field("initial_state", &self.start)
            .field(
                "final_states",
                &self
                    .graph
                    .node_indices()
                    .filter(|state| self.graph[*state].accepting)
                    .collect_vec(),
            )
            .field(
                "transitions",
                &self
                    .graph
                    .edge_references()
                    .map(|edge| {
                        format!(
                            "{:?} --- {:?} --> {:?}",
                            edge.source(),
                            edge.weight(),
                            edge.target()
                        )
                    })
                    .collect_vec(),
            )
            .finish()
    }
}

/// One instantaneous configuration of a DFA run. A DFA carries no extra
/// memory, so the configuration is just the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfaConfiguration {
    pub state: NodeIndex,
}

/// A lazy, finite, non-restartable stepwise run of a [DFA].
///
/// Created by [`DFA::execute`]. Stopping early is safe and releases
/// everything; there is no background work to cancel.
pub struct DfaRun<'a, N: AutomatonNode, S: Letter> {
    dfa: &'a DFA<N, S>,
    input: slice::Iter<'a, S>,
    current: NodeIndex,
    phase: RunPhase,
}

impl<N: AutomatonNode, S: Letter> Iterator for DfaRun<'_, N, S> {
    type Item = Result<DfaConfiguration, AutomatonError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            RunPhase::Initial => {
                self.phase = RunPhase::Stepping;
                Some(Ok(DfaConfiguration {
                    state: self.current,
                }))
            }
            RunPhase::Stepping => match self.input.next() {
                Some(symbol) => match self.dfa.successor(self.current, symbol) {
                    Some(next) => {
                        self.current = next;
                        Some(Ok(DfaConfiguration { state: next }))
                    }
                    None => {
                        self.phase = RunPhase::Done;
                        Some(Err(AutomatonError::missing_symbol(self.current, symbol)))
                    }
                },
                None => {
                    self.phase = RunPhase::Done;
                    if self.dfa.is_accepting(self.current) {
                        None
                    } else {
                        Some(Err(AutomatonError::rejection(self.current)))
                    }
                }
            },
            RunPhase::Done => None,
        }
    }
}
