use std::collections::VecDeque;

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
        state::StateNode,
    },
    error::AutomatonError,
};

/// Head movement of a [DTM] transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadMove {
    Left,
    Right,
    Stay,
}

/// A transition label of a [DTM]: enabled when `read` is under the head;
/// applying it writes `write`, moves the head, and changes state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TmEdge<S: Letter> {
    pub read: S,
    pub write: S,
    pub direction: HeadMove,
}

impl<S: Letter> TmEdge<S> {
    pub fn new(read: S, write: S, direction: HeadMove) -> Self {
        TmEdge {
            read,
            write,
            direction,
        }
    }
}

/// The tape memory of a [DTM]: a conceptually two-way-infinite sequence of
/// tape symbols, materialized lazily. Only the visited range is stored; any
/// cell outside it reads as the blank symbol, and moving the head past a
/// boundary extends the range by exactly one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape<S: Letter> {
    cells: VecDeque<S>,
    head: usize,
    origin: usize,
    blank: S,
}

impl<S: Letter> Tape<S> {
    /// A tape holding `input` left-aligned with the head on position 0.
    pub fn new(input: &[S], blank: S) -> Self {
        let mut cells: VecDeque<S> = input.iter().cloned().collect();
        if cells.is_empty() {
            cells.push_back(blank.clone());
        }

        Tape {
            cells,
            head: 0,
            origin: 0,
            blank,
        }
    }

    /// The symbol under the head.
    pub fn read(&self) -> &S {
        &self.cells[self.head]
    }

    /// Overwrites the cell under the head.
    pub fn write(&mut self, symbol: S) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head one cell, extending the visited range with a blank
    /// cell when the head crosses a boundary.
    pub fn move_head(&mut self, direction: HeadMove) {
        match direction {
            HeadMove::Left => {
                if self.head == 0 {
                    self.cells.push_front(self.blank.clone());
                    self.origin += 1;
                } else {
                    self.head -= 1;
                }
            }
            HeadMove::Right => {
                self.head += 1;
                if self.head == self.cells.len() {
                    self.cells.push_back(self.blank.clone());
                }
            }
            HeadMove::Stay => {}
        }
    }

    /// The head position relative to the start of the input. Negative when
    /// the head moved past the left end.
    pub fn position(&self) -> isize {
        self.head as isize - self.origin as isize
    }

    /// The number of visited cells.
    pub fn visited_len(&self) -> usize {
        self.cells.len()
    }

    /// The visited cells in tape order, leftmost first.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.cells.iter()
    }
}

/// A deterministic Turing machine with input alphabet `S` drawn from a tape
/// alphabet that also contains a distinguished blank symbol.
///
/// The transition table is partial by design: the machine halts when no
/// transition is defined for the current (state, read symbol) pair, and the
/// halting state decides acceptance. Whether a machine halts at all is not
/// decidable here; callers needing a step budget truncate the run iterator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DTM<N: AutomatonNode, S: Letter> {
    start: Option<NodeIndex>,
    pub graph: DiGraph<StateNode<N>, TmEdge<S>>,
    alphabet: Vec<S>,
    tape_alphabet: Vec<S>,
    blank: S,
}

impl<N: AutomatonNode, S: Letter> DTM<N, S> {
    pub fn new(alphabet: Vec<S>, tape_alphabet: Vec<S>, blank: S) -> Self {
        DTM {
            alphabet,
            tape_alphabet,
            blank,
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

    pub fn tape_alphabet(&self) -> &[S] {
        self.tape_alphabet.as_slice()
    }

    pub fn blank_symbol(&self) -> &S {
        &self.blank
    }

    /// The transition enabled by `symbol` under the head, if defined.
    pub fn transition(&self, state: NodeIndex, symbol: &S) -> Option<(NodeIndex, S, HeadMove)> {
        self.graph
            .edges_directed(state, Direction::Outgoing)
            .find(|edge| edge.weight().read == *symbol)
            .map(|edge| {
                (
                    edge.target(),
                    edge.weight().write.clone(),
                    edge.weight().direction,
                )
            })
    }

    /// Starts a stepwise run over `input`.
    ///
    /// The returned iterator yields the initial configuration (input written
    /// left-aligned, head on position 0), then one configuration per applied
    /// transition. The run ends when the machine halts: cleanly when the
    /// halting state accepts, with [AutomatonError::Rejection] otherwise. A
    /// machine that never halts yields forever; bound it with `take`.
    pub fn execute<'a>(&'a self, input: &'a [S]) -> Result<TmRun<'a, N, S>, AutomatonError> {
        self.validate()?;

        if let Some(symbol) = input.iter().find(|symbol| !self.contains_letter(symbol)) {
            return Err(AutomatonError::invalid_symbol(symbol));
        }

        Ok(TmRun {
            dtm: self,
            tape: Tape::new(input, self.blank.clone()),
            state: self.start.expect("validated DTM has an initial state"),
            phase: RunPhase::Initial,
        })
    }
}

impl<N, S> DTM<N, S>
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

impl<N: AutomatonNode, S: Letter> Validate for DTM<N, S> {
    fn validate(&self) -> Result<(), AutomatonError> {
        let start = self
            .start
            .ok_or_else(|| AutomatonError::initial_state("no initial state set"))?;
        if self.graph.node_weight(start).is_none() {
            return Err(AutomatonError::InvalidState { state: start });
        }

        for edge in self.graph.edge_references() {
            let label = edge.weight();
            if !self.tape_alphabet.contains(&label.read) {
                return Err(AutomatonError::invalid_symbol(&label.read));
            }
            if !self.tape_alphabet.contains(&label.write) {
                return Err(AutomatonError::invalid_symbol(&label.write));
            }
        }

        // determinism: per state, at most one transition per read symbol.
        // totality is not required, a missing entry is the halt condition.
        for state in self.graph.node_indices() {
            for symbol in self.tape_alphabet.iter() {
                let matching = self
                    .graph
                    .edges_directed(state, Direction::Outgoing)
                    .filter(|edge| edge.weight().read == *symbol)
                    .count();
                if matching > 1 {
                    return Err(AutomatonError::determinism_violation(state, symbol));
                }
            }
        }

        // final states are halt states and carry no transitions
        for state in self.graph.node_indices() {
            if self.graph[state].accepting
                && self
                    .graph
                    .edges_directed(state, Direction::Outgoing)
                    .next()
                    .is_some()
            {
                return Err(AutomatonError::final_state(format!(
                    "final state {state:?} has outgoing transitions"
                )));
            }
        }

        // tape alphabet extras: the blank belongs to the tape alphabet but
        // never to the input alphabet, which the tape alphabet covers
        if !self.tape_alphabet.contains(&self.blank) {
            return Err(AutomatonError::invalid_symbol(&self.blank));
        }
        if self.alphabet.contains(&self.blank) {
            return Err(AutomatonError::invalid_symbol(&self.blank));
        }
        if let Some(symbol) = self
            .alphabet
            .iter()
            .find(|symbol| !self.tape_alphabet.contains(symbol))
        {
            return Err(AutomatonError::invalid_symbol(symbol));
        }

        Ok(())
    }
}

impl<N: AutomatonNode, S: Letter> Alphabet for DTM<N, S> {
    type Letter = S;

    fn alphabet(&self) -> &[S] {
        self.alphabet.as_slice()
    }
}

impl<N: AutomatonNode, S: Letter> AutBuild<NodeIndex, EdgeIndex, StateNode<N>, TmEdge<S>>
    for DTM<N, S>
{
    fn add_state(&mut self, data: StateNode<N>) -> NodeIndex {
        self.graph.add_node(data)
    }

    fn add_transition(&mut self, from: NodeIndex, to: NodeIndex, label: TmEdge<S>) -> EdgeIndex {
        self.graph.add_edge(from, to, label)
    }
}

impl<N: AutomatonNode, S: Letter> InitializedAutomaton for DTM<N, S> {
    fn get_initial(&self) -> NodeIndex {
        self.start.expect("DTM must have an initial state")
    }

    fn set_initial(&mut self, state: NodeIndex) {
        self.start = Some(state);
    }

    fn is_accepting(&self, state: NodeIndex) -> bool {
        self.graph
            .node_weight(state)
            .map(|node| node.accepting)
            .expect("state should be part of the DTM")
    }

    fn set_accepting(&mut self, state: NodeIndex) {
        self.graph[state].accepting = true;
    }
}

impl<N: AutomatonNode, S: Letter> Language for DTM<N, S> {
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

/// One instantaneous configuration of a [DTM] run: the current state plus a
/// snapshot of the tape, including the head position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmConfiguration<S: Letter> {
    pub state: NodeIndex,
    pub tape: Tape<S>,
}

/// A lazy, non-restartable stepwise run of a [DTM].
/// Created by [`DTM::execute`]. Every yielded configuration owns its tape
/// snapshot; the live tape is mutated in place and never exposed.
pub struct TmRun<'a, N: AutomatonNode, S: Letter> {
    dtm: &'a DTM<N, S>,
    tape: Tape<S>,
    state: NodeIndex,
    phase: RunPhase,
}

impl<N: AutomatonNode, S: Letter> TmRun<'_, N, S> {
    fn configuration(&self) -> TmConfiguration<S> {
        TmConfiguration {
            state: self.state,
            tape: self.tape.clone(),
        }
    }
}

impl<N: AutomatonNode, S: Letter> Iterator for TmRun<'_, N, S> {
    type Item = Result<TmConfiguration<S>, AutomatonError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            RunPhase::Initial => {
                self.phase = RunPhase::Stepping;
                Some(Ok(self.configuration()))
            }
            RunPhase::Stepping => {
                let symbol = self.tape.read().clone();

                match self.dtm.transition(self.state, &symbol) {
                    Some((target, write, direction)) => {
                        self.tape.write(write);
                        self.tape.move_head(direction);
                        self.state = target;
                        Some(Ok(self.configuration()))
                    }
                    None => {
                        self.phase = RunPhase::Done;
                        if self.dtm.is_accepting(self.state) {
                            None
                        } else {
                            Some(Err(AutomatonError::rejection(self.state)))
                        }
                    }
                }
            }
            RunPhase::Done => None,
        }
    }
}
