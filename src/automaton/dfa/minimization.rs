use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::{
    automaton::{
        Alphabet, AutBuild, AutomatonNode, InitializedAutomaton, Letter, Validate,
        dfa::DFA,
        index_map::IndexMap,
        state::StateNode,
    },
    error::AutomatonError,
};

/// The working partition used in the minimization of a DFA.
///
/// Holds the reachable states of the input DFA grouped into disjoint blocks.
/// Two states share a block iff they have not been distinguished by any input
/// suffix at the current refinement step; refinement splits blocks until that
/// grouping is exact (Myhill–Nerode equivalence). Unreachable states are
/// never entered into the partition, which realizes the pruning phase.
pub struct PartitionTable<'a, N: AutomatonNode, S: Letter> {
    dfa: &'a DFA<N, S>,
    blocks: Vec<Vec<NodeIndex>>,
    block_of: IndexMap<NodeIndex, usize>,
}

impl<'a, N: AutomatonNode, S: Letter> PartitionTable<'a, N, S> {
    /// Seeds the partition with the reachable accepting and non-accepting
    /// states. An empty seed block is discarded.
    pub fn new(dfa: &'a DFA<N, S>) -> Self {
        let mut reachable = dfa.reachable_states();
        reachable.sort();

        let mut accepting = vec![];
        let mut rejecting = vec![];
        for &state in &reachable {
            if dfa.graph[state].accepting {
                accepting.push(state);
            } else {
                rejecting.push(state);
            }
        }

        let mut blocks = vec![];
        for seed in [accepting, rejecting] {
            if !seed.is_empty() {
                blocks.push(seed);
            }
        }

        let mut table = PartitionTable {
            dfa,
            blocks,
            block_of: IndexMap::new(dfa.state_count()),
        };
        table.rebuild_lookup();
        table
    }

    fn rebuild_lookup(&mut self) {
        self.block_of = IndexMap::new(self.dfa.state_count());
        for (block_index, block) in self.blocks.iter().enumerate() {
            for &state in block {
                self.block_of.insert(state, block_index);
            }
        }
    }

    /// The tuple of target blocks a state reaches, one entry per alphabet
    /// symbol. States with equal signatures are indistinguishable for one
    /// more step.
    fn signature(&self, state: NodeIndex) -> Vec<usize> {
        self.dfa
            .alphabet()
            .iter()
            .map(|symbol| {
                let target = self
                    .dfa
                    .successor(state, symbol)
                    .expect("validated DFA is total on reachable states");
                self.block_of[target]
            })
            .collect()
    }

    /// Splits blocks by signature until a full pass splits nothing.
    ///
    /// Each pass regroups every block's members by their signature; members
    /// are visited in ascending state order and groups keep first-seen order,
    /// so the final block layout is deterministic.
    pub fn refine(&mut self) {
        let mut pass = 0;
        loop {
            pass += 1;
            let mut changed = false;
            let mut next_blocks = Vec::with_capacity(self.blocks.len());

            for block in &self.blocks {
                if block.len() == 1 {
                    next_blocks.push(block.clone());
                    continue;
                }

                let mut groups: Vec<Vec<NodeIndex>> = vec![];
                let mut lookup: HashMap<Vec<usize>, usize> = HashMap::new();

                for &state in block {
                    let signature = self.signature(state);
                    match lookup.get(&signature) {
                        Some(&group) => groups[group].push(state),
                        None => {
                            lookup.insert(signature, groups.len());
                            groups.push(vec![state]);
                        }
                    }
                }

                if groups.len() > 1 {
                    changed = true;
                }
                next_blocks.extend(groups);
            }

            self.blocks = next_blocks;
            self.rebuild_lookup();

            if !changed {
                debug!(
                    "partition refinement reached a fixed point after {} passes with {} blocks",
                    pass,
                    self.blocks.len()
                );
                break;
            }
        }
    }

    /// Collapses each block into one state of a fresh DFA.
    ///
    /// Blocks are emitted in ascending order of their smallest original state
    /// index, so repeated minimization of equal inputs produces identical
    /// outputs. Transitions are taken from each block's smallest member; the
    /// refinement fixed point guarantees every member agrees.
    pub fn into_dfa(mut self) -> DFA<N, S> {
        self.blocks.sort_by_key(|block| block[0]);
        self.rebuild_lookup();

        let mut minimized = DFA::new(self.dfa.alphabet().to_vec());
        let mut block_states = Vec::with_capacity(self.blocks.len());

        let start = self.dfa.get_initial();

        for block in &self.blocks {
            let representative = &self.dfa.graph[block[0]];
            let state = minimized.add_state(StateNode::new(
                representative.accepting,
                false,
                representative.data().clone(),
            ));
            block_states.push(state);

            if block.contains(&start) {
                minimized.set_initial(state);
            }
        }

        for (block_index, block) in self.blocks.iter().enumerate() {
            let from = block_states[block_index];
            let mut trap = true;

            for symbol in self.dfa.alphabet() {
                let target = self
                    .dfa
                    .successor(block[0], symbol)
                    .expect("validated DFA is total on reachable states");
                let to = block_states[self.block_of[target]];
                minimized.add_transition(from, to, symbol.clone());
                if from != to {
                    trap = false;
                }
            }

            if trap && !minimized.graph[from].accepting {
                minimized.graph[from].trap = true;
            }
        }

        minimized
    }
}

pub trait Minimizable: Sized {
    fn minimize(&self) -> Result<Self, AutomatonError>;
}

impl<N: AutomatonNode, S: Letter> Minimizable for DFA<N, S> {
    /// Minimizes the DFA in two phases: unreachable states are pruned, then
    /// behaviorally equivalent states are merged by partition refinement.
    /// The result accepts the same language with the least possible number
    /// of states; minimizing again is a no-op on the state count.
    fn minimize(&self) -> Result<Self, AutomatonError> {
        self.validate()?;

        let mut table = PartitionTable::new(self);
        table.refine();

        debug!(
            "minimized {} reachable states of {} total down to {} blocks",
            self.reachable_states().len(),
            self.state_count(),
            table.blocks.len()
        );

        Ok(table.into_dfa())
    }
}
