//! Read-only annotations computed on demand over a borrowed network.
//!
//! None of these cache anything across calls: each view is built from the network as it is right now and borrows
//! it, so the borrow checker stops the network from changing underneath a live view.

use std::collections::HashMap;

use crate::traits::{Builder, LogicBuilder, Network};
use crate::Signal;

/// Longest-path depth of every node.
pub struct DepthView<'a, N> {
    network: &'a N,
    levels: Vec<usize>,
    depth: usize,
}

impl<'a, N: Network> DepthView<'a, N> {
    /// Compute the level of every node of `network`.
    #[must_use]
    pub fn new(network: &'a N) -> Self {
        let mut levels = vec![0; network.node_count()];
        for node in 0..network.node_count() {
            if let Some(deepest) = network.fanins(node).iter().map(|fanin| levels[fanin.node()]).max() {
                levels[node] = deepest + 1;
            }
        }

        let depth = network.outputs().iter().map(|output| levels[output.node()]).max().unwrap_or(0);

        Self { network, levels, depth }
    }

    /// The network this view was computed from.
    #[must_use]
    pub const fn network(&self) -> &'a N {
        self.network
    }

    /// Level of a node: 0 for the constant and inputs, otherwise one more than its deepest fanin.
    #[must_use]
    pub fn level(&self, node: usize) -> usize {
        self.levels[node]
    }

    /// The longest path from any input to any output.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Mark every node that lies on a longest input-to-output path.
    #[must_use]
    pub fn critical_nodes(&self) -> Vec<bool> {
        let mut critical = vec![false; self.levels.len()];
        for output in self.network.outputs() {
            if self.levels[output.node()] == self.depth {
                critical[output.node()] = true;
            }
        }

        for node in (0..self.levels.len()).rev() {
            if !critical[node] || self.levels[node] == 0 {
                continue;
            }
            for fanin in self.network.fanins(node) {
                if self.levels[fanin.node()] + 1 == self.levels[node] {
                    critical[fanin.node()] = true;
                }
            }
        }

        critical
    }
}

/// Fanout count and consumer list of every node.
pub struct FanoutView<'a, N> {
    network: &'a N,
    counts: Vec<usize>,
    consumers: Vec<Vec<usize>>,
}

impl<'a, N: Network> FanoutView<'a, N> {
    /// Compute the fanout of every node of `network`.
    #[must_use]
    pub fn new(network: &'a N) -> Self {
        let mut counts = vec![0; network.node_count()];
        let mut consumers = vec![Vec::new(); network.node_count()];

        for node in 0..network.node_count() {
            for fanin in network.fanins(node) {
                counts[fanin.node()] += 1;
                if consumers[fanin.node()].last() != Some(&node) {
                    consumers[fanin.node()].push(node);
                }
            }
        }
        for output in network.outputs() {
            counts[output.node()] += 1;
        }

        Self { network, counts, consumers }
    }

    /// The number of gate inputs and primary outputs referring to `node`.
    #[must_use]
    pub fn fanout_count(&self, node: usize) -> usize {
        self.counts[node]
    }

    /// The gates that use `node` as a fanin, in index order.
    #[must_use]
    pub fn consumers(&self, node: usize) -> &[usize] {
        &self.consumers[node]
    }

    /// The maximum fanout-free cone of `root`: `root` plus every gate that would become dangling if `root` were
    /// removed. Ordered from the root downwards.
    #[must_use]
    pub fn mffc(&self, root: usize) -> Vec<usize> {
        let mut references = HashMap::new();
        let mut cone = vec![root];
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            for fanin in self.network.fanins(node) {
                let fanin = fanin.node();
                if !self.network.is_gate(fanin) {
                    continue;
                }
                let count = references.entry(fanin).or_insert(self.counts[fanin]);
                *count -= 1;
                if *count == 0 {
                    cone.push(fanin);
                    stack.push(fanin);
                }
            }
        }

        cone
    }
}

/// A network under construction that keeps track of the level of every node it creates.
///
/// Rebuilding passes create nodes in topological order and never modify them afterwards, so levels can be filled
/// in as nodes appear.
pub struct LevelledNetwork<N> {
    network: N,
    levels: Vec<usize>,
}

impl<N: Network> LevelledNetwork<N> {
    /// Wrap `network`, computing levels for the nodes it already holds.
    pub fn new(network: N) -> Self {
        let mut levelled = Self { network, levels: Vec::new() };
        levelled.refresh();
        levelled
    }

    fn refresh(&mut self) {
        for node in self.levels.len()..self.network.node_count() {
            let level = self.network.fanins(node).iter().map(|fanin| self.levels[fanin.node()] + 1).max().unwrap_or(0);
            self.levels.push(level);
        }
    }

    /// The wrapped network.
    pub const fn network(&self) -> &N {
        &self.network
    }

    /// Give up level tracking and return the network.
    pub fn into_inner(self) -> N {
        self.network
    }

    /// Level of the node behind `signal`.
    pub fn signal_level(&self, signal: Signal) -> usize {
        self.levels[signal.node()]
    }

    /// Current number of node slots in the wrapped network.
    pub fn len(&self) -> usize {
        self.network.node_count()
    }

    /// Whether the wrapped network holds only the constant.
    pub fn is_empty(&self) -> bool {
        self.network.node_count() <= 1
    }
}

impl<N: Builder> LevelledNetwork<N> {
    /// Create (or find) a gate, updating levels.
    pub fn create_gate(&mut self, fanins: &[Signal]) -> Signal {
        let signal = self.network.create_gate(fanins);
        self.refresh();
        signal
    }

    /// Append an output to the wrapped network.
    pub fn add_output(&mut self, signal: Signal, name: Option<String>) -> usize {
        self.network.add_output(signal, name)
    }
}

impl<N: Network + LogicBuilder> LogicBuilder for LevelledNetwork<N> {
    fn and(&mut self, a: Signal, b: Signal) -> Signal {
        let signal = self.network.and(a, b);
        self.refresh();
        signal
    }

    fn or(&mut self, a: Signal, b: Signal) -> Signal {
        let signal = self.network.or(a, b);
        self.refresh();
        signal
    }

    fn majority(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        let signal = self.network.majority(a, b, c);
        self.refresh();
        signal
    }

    fn level(&self, signal: Signal) -> usize {
        self.signal_level(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::{DepthView, FanoutView, LevelledNetwork};
    use crate::traits::{LogicBuilder, Network};
    use crate::{Mig, Signal};

    /// M(M(a, b, c), d, e) plus a side gate M(a, b, 0).
    fn two_level() -> (Mig, [Signal; 3]) {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let d = mig.push_input();
        let e = mig.push_input();
        let inner = mig.majority(a, b, c);
        let top = mig.majority(inner, d, e);
        let side = mig.majority(a, b, Signal::FALSE);
        mig.push_output(top);
        mig.push_output(side);
        (mig, [inner, top, side])
    }

    #[test]
    fn depth_of_inputs_and_gates() {
        let (mig, [inner, top, side]) = two_level();
        let depth = DepthView::new(&mig);

        assert_eq!(depth.level(0), 0);
        assert_eq!(depth.level(1), 0);
        assert_eq!(depth.level(inner.node()), 1);
        assert_eq!(depth.level(top.node()), 2);
        assert_eq!(depth.level(side.node()), 1);
        assert_eq!(depth.depth(), 2);
    }

    #[test]
    fn critical_path_follows_deepest_fanins() {
        let (mig, [inner, top, side]) = two_level();
        let critical = DepthView::new(&mig).critical_nodes();

        assert!(critical[top.node()]);
        assert!(critical[inner.node()]);
        assert!(!critical[side.node()]);
        // Input d feeds the top gate at level 0, which is not one below level 2.
        assert!(!critical[4]);
        assert!(critical[1]);
    }

    #[test]
    fn fanout_counts_gate_edges_and_outputs() {
        let (mig, [inner, top, side]) = two_level();
        let fanout = FanoutView::new(&mig);

        assert_eq!(fanout.fanout_count(inner.node()), 1);
        assert_eq!(fanout.fanout_count(top.node()), 1);
        assert_eq!(fanout.fanout_count(side.node()), 1);
        // Input a feeds `inner` and `side`.
        assert_eq!(fanout.fanout_count(1), 2);
        assert_eq!(fanout.consumers(1), &[inner.node(), side.node()]);
        // The constant feeds `side`.
        assert_eq!(fanout.fanout_count(0), 1);
    }

    #[test]
    fn mffc_stops_at_shared_nodes() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let shared = mig.majority(a, b, Signal::FALSE);
        let private = mig.majority(a, c, Signal::TRUE);
        let top = mig.majority(shared, private, c);
        let other = mig.majority(shared, b, c);
        mig.push_output(top);
        mig.push_output(other);

        let fanout = FanoutView::new(&mig);
        let mut cone = fanout.mffc(top.node());
        cone.sort_unstable();
        assert_eq!(cone, vec![private.node(), top.node()]);
    }

    #[test]
    fn levelled_network_tracks_new_nodes() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let mut levelled = LevelledNetwork::new(mig);

        let ab = levelled.and(a, b);
        let top = levelled.or(ab, a);
        assert_eq!(levelled.level(ab), 1);
        assert_eq!(levelled.level(top), 2);
        assert_eq!(levelled.level(a), 0);

        levelled.add_output(top, None);
        assert_eq!(levelled.into_inner().outputs().len(), 1);
    }
}
