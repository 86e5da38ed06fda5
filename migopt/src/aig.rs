//! And-inverter graphs.

use std::collections::HashMap;

use crate::traits::{Builder, LogicBuilder, Network};
use crate::Signal;

/// An and-inverter graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AigNode {
    /// The constant zero. Always node 0.
    Zero,
    /// A primary input, with its port number.
    Input(usize),
    /// A two-input AND gate.
    And([Signal; 2]),
}

/// An and-inverter graph.
///
/// This is the interchange representation: it is what AIGER files hold, and what the balancing pass works on.
/// Like [`crate::Mig`], nodes are stored in topological order and gates are structurally hashed.
#[derive(Clone, Debug, PartialEq)]
pub struct Aig {
    nodes: Vec<AigNode>,
    inputs: Vec<usize>,
    outputs: Vec<Signal>,
    input_names: Vec<Option<String>>,
    output_names: Vec<Option<String>>,
    strash: HashMap<[Signal; 2], usize>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create a new and-inverter graph holding only the constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![AigNode::Zero],
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_names: Vec::new(),
            output_names: Vec::new(),
            strash: HashMap::new(),
        }
    }

    /// Find or create `a & b`, folding constants and trivial cases.
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        let (a, b) = if a < b { (a, b) } else { (b, a) };

        if a == Signal::FALSE || a == !b {
            return Signal::FALSE;
        }
        if a == Signal::TRUE || a == b {
            return b;
        }

        let fanins = [a, b];
        let node = if let Some(&node) = self.strash.get(&fanins) {
            node
        } else {
            let node = self.nodes.len();
            self.nodes.push(AigNode::And(fanins));
            self.strash.insert(fanins, node);
            node
        };
        Signal::from_node(node)
    }

    /// Returns the node stored at `node`.
    #[must_use]
    pub fn node(&self, node: usize) -> &AigNode {
        &self.nodes[node]
    }

    /// Return the inputs of this node, if it is an AND gate.
    #[must_use]
    pub fn try_unwrap_and(&self, node: usize) -> Option<[Signal; 2]> {
        match self.nodes[node] {
            AigNode::And(fanins) => Some(fanins),
            AigNode::Zero | AigNode::Input(_) => None,
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
}

impl Network for Aig {
    const ARITY: usize = 2;

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn fanins(&self, node: usize) -> &[Signal] {
        match &self.nodes[node] {
            AigNode::And(fanins) => fanins,
            AigNode::Zero | AigNode::Input(_) => &[],
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
        fanins[0] & fanins[1]
    }

    fn probability(fanins: &[f64]) -> f64 {
        fanins[0] * fanins[1]
    }

    fn gate_count(&self) -> usize {
        self.strash.len()
    }
}

impl Builder for Aig {
    fn empty() -> Self {
        Self::new()
    }

    fn add_input(&mut self, name: Option<String>) -> Signal {
        let node = self.nodes.len();
        self.nodes.push(AigNode::Input(self.inputs.len()));
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
        Self::and(self, fanins[0], fanins[1])
    }
}

impl LogicBuilder for Aig {
    fn and(&mut self, a: Signal, b: Signal) -> Signal {
        Self::and(self, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::Aig;
    use crate::traits::{Builder, Network};
    use crate::Signal;

    #[test]
    fn and_folds_constants() {
        let mut aig = Aig::new();
        let x = aig.add_input(None);

        assert_eq!(aig.and(x, Signal::FALSE), Signal::FALSE);
        assert_eq!(aig.and(Signal::TRUE, x), x);
        assert_eq!(aig.and(x, x), x);
        assert_eq!(aig.and(!x, x), Signal::FALSE);
        assert_eq!(aig.gate_count(), 0);
    }

    #[test]
    fn and_is_hashed() {
        let mut aig = Aig::new();
        let x = aig.add_input(None);
        let y = aig.add_input(None);

        let a = aig.and(x, !y);
        let b = aig.and(!y, x);
        assert_eq!(a, b);
        assert_eq!(aig.gate_count(), 1);
        assert_eq!(aig.try_unwrap_and(a.node()), Some([x, !y]));
    }

    #[test]
    fn or_through_de_morgan() {
        use crate::traits::LogicBuilder;

        let mut aig = Aig::new();
        let x = aig.add_input(None);
        let y = aig.add_input(None);
        let o = LogicBuilder::or(&mut aig, x, y);
        aig.add_output(o, None);

        assert!(o.is_complemented());
        assert_eq!(aig.try_unwrap_and(o.node()), Some([!x, !y]));
    }
}
