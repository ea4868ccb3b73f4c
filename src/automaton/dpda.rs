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

/// A transition label of a [DPDA].
///
/// The transition is enabled when the machine is in the edge's source state,
/// `top` is the current stack top, and `input` matches the next input symbol
/// (`None` consumes nothing). Applying it pops `top` and pushes `push` in
/// order, so the first element ends up deepest and the last element is the
/// new top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdaEdge<S: Letter, G: Letter> {
    pub input: Option<S>,
    pub top: G,
    pub push: Vec<G>,
}

impl<S: Letter, G: Letter> PdaEdge<S, G> {
    pub fn new(input: Option<S>, top: G, push: Vec<G>) -> Self {
        PdaEdge { input, top, push }
    }

    /// A transition consuming one input symbol.
    pub fn reading(symbol: S, top: G, push: Vec<G>) -> Self {
        PdaEdge::new(Some(symbol), top, push)
    }

    /// A transition consuming no input.
    pub fn epsilon(top: G, push: Vec<G>) -> Self {
        PdaEdge::new(None, top, push)
    }

    pub fn is_epsilon(&self) -> bool {
        self.input.is_none()
    }
}

/// How a [DPDA] judges a halted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdaAcceptance {
    /// Accept iff the machine halts in an accepting state once the input is
    /// consumed. The stack contents do not matter.
    #[default]
    FinalState,
    /// Accept iff the stack is fully emptied once the input is consumed.
    /// The mode for descriptions without accepting states.
    EmptyStack,
}

/// A deterministic pushdown automaton over the input alphabet `S` with stack
/// alphabet `G`.
///
/// The stack starts holding only the initial stack symbol. Determinism is a
/// validation guarantee: no state may carry two transitions enabled by the
/// same (input, stack top) trigger, and an epsilon transition excludes every
/// symbol transition for the same stack top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DPDA<N: AutomatonNode, S: Letter, G: Letter> {
    start: Option<NodeIndex>,
    pub graph: DiGraph<StateNode<N>, PdaEdge<S, G>>,
    alphabet: Vec<S>,
    stack_alphabet: Vec<G>,
    initial_stack: G,
    acceptance: PdaAcceptance,
}

impl<N: AutomatonNode, S: Letter, G: Letter> DPDA<N, S, G> {
    pub fn new(alphabet: Vec<S>, stack_alphabet: Vec<G>, initial_stack: G) -> Self {
        DPDA {
            alphabet,
            stack_alphabet,
            initial_stack,
            start: None,
            graph: DiGraph::new(),
            acceptance: PdaAcceptance::default(),
        }
    }

    pub fn get_start(&self) -> Option<NodeIndex> {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn stack_alphabet(&self) -> &[G] {
        self.stack_alphabet.as_slice()
    }

    pub fn initial_stack_symbol(&self) -> &G {
        &self.initial_stack
    }

    pub fn acceptance(&self) -> PdaAcceptance {
        self.acceptance
    }

    pub fn set_acceptance(&mut self, acceptance: PdaAcceptance) {
        self.acceptance = acceptance;
    }

    /// The transition consuming `symbol` with `top` on the stack, if defined.
    pub fn symbol_transition(
        &self,
        state: NodeIndex,
        symbol: &S,
        top: &G,
    ) -> Option<(NodeIndex, Vec<G>)> {
        self.graph
            .edges_directed(state, Direction::Outgoing)
            .find(|edge| edge.weight().input.as_ref() == Some(symbol) && edge.weight().top == *top)
            .map(|edge| (edge.target(), edge.weight().push.clone()))
    }

    /// The transition consuming no input with `top` on the stack, if defined.
    pub fn epsilon_transition(&self, state: NodeIndex, top: &G) -> Option<(NodeIndex, Vec<G>)> {
        self.graph
            .edges_directed(state, Direction::Outgoing)
            .find(|edge| edge.weight().is_epsilon() && edge.weight().top == *top)
            .map(|edge| (edge.target(), edge.weight().push.clone()))
    }

    /// Starts a stepwise run over `input`.
    ///
    /// The returned iterator yields the initial configuration, then one
    /// configuration per applied transition, epsilon moves included. After
    /// the input is consumed, epsilon moves keep being applied until the
    /// acceptance condition holds or no move remains; a run that gets stuck
    /// ends with [AutomatonError::Rejection]. A divergent epsilon chain is
    /// not detected; callers needing a bound truncate the iterator.
    pub fn execute<'a>(&'a self, input: &'a [S]) -> Result<PdaRun<'a, N, S, G>, AutomatonError> {
        self.validate()?;

        if let Some(symbol) = input.iter().find(|symbol| !self.contains_letter(symbol)) {
            return Err(AutomatonError::invalid_symbol(symbol));
        }

        Ok(PdaRun {
            dpda: self,
            input,
            pos: 0,
            state: self.start.expect("validated DPDA has an initial state"),
            stack: vec![self.initial_stack.clone()],
            phase: RunPhase::Initial,
        })
    }
}

impl<N, S, G> DPDA<N, S, G>
where
    N: AutomatonNode + Serialize + DeserializeOwned,
    S: Letter + Serialize + DeserializeOwned,
    G: Letter + Serialize + DeserializeOwned,
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

impl<N: AutomatonNode, S: Letter, G: Letter> Validate for DPDA<N, S, G> {
    fn validate(&self) -> Result<(), AutomatonError> {
        let start = self
            .start
            .ok_or_else(|| AutomatonError::initial_state("no initial state set"))?;
        if self.graph.node_weight(start).is_none() {
            return Err(AutomatonError::InvalidState { state: start });
        }

        for edge in self.graph.edge_references() {
            let label = edge.weight();

            if let Some(symbol) = &label.input
                && !self.alphabet.contains(symbol)
            {
                return Err(AutomatonError::invalid_symbol(symbol));
            }
            if !self.stack_alphabet.contains(&label.top) {
                return Err(AutomatonError::invalid_symbol(&label.top));
            }
            if let Some(symbol) = label
                .push
                .iter()
                .find(|symbol| !self.stack_alphabet.contains(symbol))
            {
                return Err(AutomatonError::invalid_symbol(symbol));
            }
        }

        // determinism: per state, no two transitions share a trigger, and an
        // epsilon transition excludes symbol transitions for the same top
        for state in self.graph.node_indices() {
            let labels = self
                .graph
                .edges_directed(state, Direction::Outgoing)
                .map(|edge| edge.weight())
                .collect::<Vec<_>>();

            for (i, a) in labels.iter().enumerate() {
                for b in labels.iter().skip(i + 1) {
                    if a.top != b.top {
                        continue;
                    }
                    if a.input == b.input || a.is_epsilon() || b.is_epsilon() {
                        return Err(AutomatonError::determinism_violation(
                            state,
                            &(&a.input, &a.top),
                        ));
                    }
                }
            }
        }

        if !self.stack_alphabet.contains(&self.initial_stack) {
            return Err(AutomatonError::initial_state(format!(
                "initial stack symbol {:?} is not in the stack alphabet",
                self.initial_stack
            )));
        }

        Ok(())
    }
}

impl<N: AutomatonNode, S: Letter, G: Letter> Alphabet for DPDA<N, S, G> {
    type Letter = S;

    fn alphabet(&self) -> &[S] {
        self.alphabet.as_slice()
    }
}

impl<N: AutomatonNode, S: Letter, G: Letter>
    AutBuild<NodeIndex, EdgeIndex, StateNode<N>, PdaEdge<S, G>> for DPDA<N, S, G>
{
    fn add_state(&mut self, data: StateNode<N>) -> NodeIndex {
        self.graph.add_node(data)
    }

    fn add_transition(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        label: PdaEdge<S, G>,
    ) -> EdgeIndex {
        self.graph.add_edge(from, to, label)
    }
}

impl<N: AutomatonNode, S: Letter, G: Letter> InitializedAutomaton for DPDA<N, S, G> {
    fn get_initial(&self) -> NodeIndex {
        self.start.expect("DPDA must have an initial state")
    }

    fn set_initial(&mut self, state: NodeIndex) {
        self.start = Some(state);
    }

    fn is_accepting(&self, state: NodeIndex) -> bool {
        self.graph
            .node_weight(state)
            .map(|node| node.accepting)
            .expect("state should be part of the DPDA")
    }

    fn set_accepting(&mut self, state: NodeIndex) {
        self.graph[state].accepting = true;
    }
}

impl<N: AutomatonNode, S: Letter, G: Letter> Language for DPDA<N, S, G> {
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

/// One instantaneous configuration of a [DPDA] run: the current state plus a
/// snapshot of the stack, bottom first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaConfiguration<G: Letter> {
    pub state: NodeIndex,
    pub stack: Vec<G>,
}

impl<G: Letter> PdaConfiguration<G> {
    pub fn stack_top(&self) -> Option<&G> {
        self.stack.last()
    }
}

/// A lazy, finite, non-restartable stepwise run of a [DPDA].
/// Created by [`DPDA::execute`]. Every yielded configuration owns its stack
/// snapshot; the live stack is never exposed.
pub struct PdaRun<'a, N: AutomatonNode, S: Letter, G: Letter> {
    dpda: &'a DPDA<N, S, G>,
    input: &'a [S],
    pos: usize,
    state: NodeIndex,
    stack: Vec<G>,
    phase: RunPhase,
}

impl<N: AutomatonNode, S: Letter, G: Letter> PdaRun<'_, N, S, G> {
    fn condition_met(&self) -> bool {
        match self.dpda.acceptance() {
            PdaAcceptance::FinalState => self.dpda.is_accepting(self.state),
            PdaAcceptance::EmptyStack => self.stack.is_empty(),
        }
    }

    fn configuration(&self) -> PdaConfiguration<G> {
        PdaConfiguration {
            state: self.state,
            stack: self.stack.clone(),
        }
    }
}

impl<N: AutomatonNode, S: Letter, G: Letter> Iterator for PdaRun<'_, N, S, G> {
    type Item = Result<PdaConfiguration<G>, AutomatonError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            RunPhase::Initial => {
                self.phase = RunPhase::Stepping;
                Some(Ok(self.configuration()))
            }
            RunPhase::Stepping => {
                let input_done = self.pos == self.input.len();
                if input_done && self.condition_met() {
                    self.phase = RunPhase::Done;
                    return None;
                }

                let Some(top) = self.stack.last().cloned() else {
                    // nothing left to pop, so no transition can fire
                    self.phase = RunPhase::Done;
                    return Some(Err(AutomatonError::rejection(self.state)));
                };

                // symbol transitions first; the validator rules out a
                // simultaneously enabled epsilon transition
                let step = if input_done {
                    self.dpda
                        .epsilon_transition(self.state, &top)
                        .map(|transition| (transition, false))
                } else {
                    self.dpda
                        .symbol_transition(self.state, &self.input[self.pos], &top)
                        .map(|transition| (transition, true))
                        .or_else(|| {
                            self.dpda
                                .epsilon_transition(self.state, &top)
                                .map(|transition| (transition, false))
                        })
                };

                match step {
                    Some(((target, push), consumed)) => {
                        if consumed {
                            self.pos += 1;
                        }
                        self.stack.pop();
                        self.stack.extend(push);
                        self.state = target;
                        Some(Ok(self.configuration()))
                    }
                    None => {
                        self.phase = RunPhase::Done;
                        Some(Err(AutomatonError::rejection(self.state)))
                    }
                }
            }
            RunPhase::Done => None,
        }
    }
}
