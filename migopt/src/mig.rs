//! Majority-inverter graphs.

use std::collections::HashMap;

use crate::traits::{translate, Builder, LogicBuilder, Network};
use crate::view::LevelledNetwork;
use crate::Signal;

/// A majority-inverter graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MigNode {
    /// The constant zero. Always node 0.
    Zero,
    /// A primary input, with its port number.
    Input(usize),
    /// A three-input majority gate.
    Majority([Signal; 3]),
}

/// A majority-inverter graph.
///
/// Nodes live in an arena in creation order, which is also a topological order. Gates are structurally hashed, so
/// asking for the same majority twice returns the same node.
#[derive(Clone, Debug, PartialEq)]
pub struct Mig {
    nodes: Vec<MigNode>,
    inputs: Vec<usize>,
    outputs: Vec<Signal>,
    input_names: Vec<Option<String>>,
    output_names: Vec<Option<String>>,
    strash: HashMap<[Signal; 3], usize>,
}

impl Default for Mig {
    fn default() -> Self {
        Self::new()
    }
}

impl Mig {
    /// Create a new majority-inverter graph holding only the constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![MigNode::Zero],
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_names: Vec::new(),
            output_names: Vec::new(),
            strash: HashMap::new(),
        }
    }

    /// Append an input to the graph.
    pub fn push_input(&mut self) -> Signal {
        self.add_input(None)
    }

    /// Append an output to the graph, returning its port number.
    pub fn push_output(&mut self, signal: Signal) -> usize {
        self.add_output(signal, None)
    }

    /// Find or create the 3-input majority gate `M(x, y, z)`.
    ///
    /// The majority axiom is applied on the way in (`M(x, x, y) = x` and `M(x, x', y) = y`), and inverters are
    /// propagated to the output whenever two or more inputs are inverted (`M(x', y', z) = M(x, y, z')'`), so every
    /// stored gate has at most one inverted input.
    pub fn majority(&mut self, x: Signal, y: Signal, z: Signal) -> Signal {
        let mut fanins = [x, y, z];
        fanins.sort_unstable();
        let [x, y, z] = fanins;

        // Sorting puts a node's two polarities next to each other.
        if x == y {
            return x;
        }
        if y == z {
            return y;
        }
        if x == !y {
            return z;
        }
        if y == !z {
            return x;
        }

        let inverted = fanins.iter().filter(|fanin| fanin.is_complemented()).count() >= 2;
        if inverted {
            fanins = [!x, !y, !z];
        }

        let node = if let Some(&node) = self.strash.get(&fanins) {
            node
        } else {
            let node = self.nodes.len();
            self.nodes.push(MigNode::Majority(fanins));
            self.strash.insert(fanins, node);
            node
        };

        Signal::new(node, inverted)
    }

    /// Returns the node stored at `node`.
    #[must_use]
    pub fn node(&self, node: usize) -> &MigNode {
        &self.nodes[node]
    }

    /// Return the inputs of this node, if it is a majority gate.
    #[must_use]
    pub fn try_unwrap_majority(&self, node: usize) -> Option<[Signal; 3]> {
        match self.nodes[node] {
            MigNode::Majority(fanins) => Some(fanins),
            MigNode::Zero | MigNode::Input(_) => None,
        }
    }

    /// Number of primary inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of primary outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Rebuild this graph gate by gate, in topological order, then sweep the result.
    ///
    /// `gate` receives the network under construction, the map from old nodes to new signals (filled in for every
    /// node before the current one), the index of the gate in `self` and the gate's fanins translated into the new
    /// network. It returns the signal that replaces the gate.
    pub(crate) fn rebuild(
        &self,
        mut gate: impl FnMut(&mut LevelledNetwork<Self>, &[Signal], usize, [Signal; 3]) -> Signal,
    ) -> Self {
        let (network, mut map) = Self::clone_interface(self);
        let mut levelled = LevelledNetwork::new(network);

        for node in 0..self.node_count() {
            if let Some(fanins) = self.try_unwrap_majority(node) {
                let fanins = fanins.map(|fanin| translate(&map, fanin));
                let signal = gate(&mut levelled, &map, node, fanins);
                map[node] = signal;
            }
        }

        let mut network = levelled.into_inner();
        network.copy_outputs(self, &map);
        network.sweep()
    }
}

impl Network for Mig {
    const ARITY: usize = 3;

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn fanins(&self, node: usize) -> &[Signal] {
        match &self.nodes[node] {
            MigNode::Majority(fanins) => fanins,
            MigNode::Zero | MigNode::Input(_) => &[],
        }
    }

    fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    fn outputs(&self) -> &[Signal] {
        &self.outputs
    }

    fn input_name(&self, port: usize) -> Option<&str> {
        self.input_names.get(port)?.as_deref()
    }

    fn output_name(&self, port: usize) -> Option<&str> {
        self.output_names.get(port)?.as_deref()
    }

    fn evaluate(fanins: &[u64]) -> u64 {
        let (a, b, c) = (fanins[0], fanins[1], fanins[2]);
        (a & b) | (b & c) | (a & c)
    }

    fn probability(fanins: &[f64]) -> f64 {
        let (a, b, c) = (fanins[0], fanins[1], fanins[2]);
        a * b + b * c + a * c - 2.0 * a * b * c
    }

    fn gate_count(&self) -> usize {
        self.strash.len()
    }
}

impl Builder for Mig {
    fn empty() -> Self {
        Self::new()
    }

    fn add_input(&mut self, name: Option<String>) -> Signal {
        let node = self.nodes.len();
        self.nodes.push(MigNode::Input(self.inputs.len()));
        self.inputs.push(node);
        self.input_names.push(name);
        Signal::from_node(node)
    }

    fn add_output(&mut self, signal: Signal, name: Option<String>) -> usize {
        self.outputs.push(signal);
        self.output_names.push(name);
        self.outputs.len() - 1
    }

    fn create_gate(&mut self, fanins: &[Signal]) -> Signal {
        self.majority(fanins[0], fanins[1], fanins[2])
    }
}

impl LogicBuilder for Mig {
    fn and(&mut self, a: Signal, b: Signal) -> Signal {
        self.majority(a, b, Signal::FALSE)
    }

    fn or(&mut self, a: Signal, b: Signal) -> Signal {
        self.majority(a, b, Signal::TRUE)
    }

    fn majority(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        Self::majority(self, a, b, c)
    }
}
