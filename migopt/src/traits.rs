//! The interfaces shared by both graph representations.

use crate::Signal;

/// A combinational logic network to be inspected.
///
/// Nodes are addressed by index. Index `0` is always the constant zero, and every gate only refers to nodes with a
/// smaller index than its own, so iterating over `0..node_count()` visits the graph in topological order.
pub trait Network {
    /// The number of fanins of every gate in this representation.
    const ARITY: usize;

    /// Returns the number of node slots, i.e. the largest node index plus one.
    fn node_count(&self) -> usize;
    /// Returns the inputs (fan-in) of a node. Empty for the constant and for primary inputs.
    fn fanins(&self, node: usize) -> &[Signal];
    /// Returns the primary input nodes in port order.
    fn inputs(&self) -> &[usize];
    /// Returns the primary output signals in port order.
    fn outputs(&self) -> &[Signal];
    /// Returns the symbol attached to an input port, if any.
    fn input_name(&self, port: usize) -> Option<&str>;
    /// Returns the symbol attached to an output port, if any.
    fn output_name(&self, port: usize) -> Option<&str>;

    /// Evaluate one gate bit-parallel, given the (already complemented) values of its fanins.
    fn evaluate(fanins: &[u64]) -> u64;
    /// The probability of a gate output being one, given independent fanin probabilities.
    fn probability(fanins: &[f64]) -> f64;

    /// Returns true if this node is a gate (neither the constant nor an input).
    fn is_gate(&self, node: usize) -> bool {
        !self.fanins(node).is_empty()
    }

    /// Returns the number of gates, excluding the constant and the inputs.
    fn gate_count(&self) -> usize {
        (0..self.node_count()).filter(|&node| self.is_gate(node)).count()
    }
}

/// A network that can be grown one node at a time.
pub trait Builder: Network + Sized {
    /// Create a network holding only the constant.
    fn empty() -> Self;
    /// Append a primary input.
    fn add_input(&mut self, name: Option<String>) -> Signal;
    /// Append a primary output driven by `signal`, returning its port number.
    fn add_output(&mut self, signal: Signal, name: Option<String>) -> usize;
    /// Create (or find) a gate with exactly `Self::ARITY` fanins.
    fn create_gate(&mut self, fanins: &[Signal]) -> Signal;

    /// Create a network with the same inputs as `source`, returning it together with a node map that has the
    /// constant and every input filled in.
    fn clone_interface<N: Network>(source: &N) -> (Self, Vec<Signal>) {
        let mut network = Self::empty();
        let mut map = vec![Signal::FALSE; source.node_count()];
        for (port, &node) in source.inputs().iter().enumerate() {
            map[node] = network.add_input(source.input_name(port).map(String::from));
        }
        (network, map)
    }

    /// Copy the outputs of `source` onto this network through a node map.
    fn copy_outputs<N: Network>(&mut self, source: &N, map: &[Signal]) {
        for (port, &output) in source.outputs().iter().enumerate() {
            self.add_output(translate(map, output), source.output_name(port).map(String::from));
        }
    }

    /// Garbage-collect the graph, removing orphan nodes.
    ///
    /// This is "stop and copy" garbage collection: everything reachable from an output is copied into a fresh
    /// network in its original order. Inputs are always kept so the interface does not change.
    #[must_use]
    fn sweep(&self) -> Self {
        let node_count = self.node_count();
        let mut referenced = vec![false; node_count];

        let mut visit_list = self.outputs().iter().map(|output| output.node()).collect::<Vec<_>>();
        while let Some(node) = visit_list.pop() {
            if referenced[node] {
                continue;
            }
            referenced[node] = true;
            visit_list.extend(self.fanins(node).iter().map(|fanin| fanin.node()));
        }

        let (mut swept, mut map) = Self::clone_interface(self);
        for node in (0..node_count).filter(|&node| referenced[node] && self.is_gate(node)) {
            let fanins = self.fanins(node).iter().map(|&fanin| translate(&map, fanin)).collect::<Vec<_>>();
            map[node] = swept.create_gate(&fanins);
        }
        swept.copy_outputs(self, &map);
        swept
    }
}

/// Something that knows how to build AND/OR/majority logic.
///
/// Both representations implement this, so a function can be synthesized into either of them.
pub trait LogicBuilder {
    /// Build `a & b`.
    fn and(&mut self, a: Signal, b: Signal) -> Signal;

    /// Build `a | b`.
    fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    /// Build `M(a, b, c)`.
    fn majority(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        // M(a, b, c) = ab + c(a + b)
        let ab = self.and(a, b);
        let a_or_b = self.or(a, b);
        let rest = self.and(c, a_or_b);
        self.or(ab, rest)
    }

    /// The logic level of a signal, for builders that track it.
    fn level(&self, _signal: Signal) -> usize {
        0
    }
}

/// Map `signal` through a node map, carrying its inversion along.
#[must_use]
pub fn translate(map: &[Signal], signal: Signal) -> Signal {
    map[signal.node()].complement_if(signal.is_complemented())
}
