//! Bit-parallel simulation.
//!
//! Every node value is a `u64` holding 64 input patterns. Small functions (up to six variables) are represented
//! as a single word truth table, with variable `i` laid out like [`var_mask`]`(i)`.

use std::collections::HashMap;

use crate::traits::Network;
use crate::Signal;

/// The largest number of inputs [`truth_tables`] will enumerate exhaustively.
pub const MAX_EXHAUSTIVE_INPUTS: usize = 16;

const VAR_MASKS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// The truth table of the `var`-th projection function over six variables.
#[must_use]
pub const fn var_mask(var: usize) -> u64 {
    VAR_MASKS[var]
}

/// Mask selecting the meaningful bits of a truth table over `vars` variables.
#[must_use]
pub const fn table_mask(vars: usize) -> u64 {
    if vars >= 6 {
        u64::MAX
    } else {
        (1u64 << (1u32 << vars)) - 1
    }
}

/// Replicate a truth table over `vars` variables so that it fills the whole word and is independent of the
/// variables above `vars`.
#[must_use]
pub const fn extend(table: u64, vars: usize) -> u64 {
    let mut table = table & table_mask(vars);
    let mut width = 1u32 << if vars > 6 { 6 } else { vars };
    while width < 64 {
        table |= table << width;
        width *= 2;
    }
    table
}

/// Value of `signal` given the value of its node.
#[must_use]
pub const fn apply(value: u64, signal: Signal) -> u64 {
    if signal.is_complemented() {
        !value
    } else {
        value
    }
}

/// Simulate the whole network on one word of input patterns per primary input, returning one word per node.
#[must_use]
pub fn simulate<N: Network>(network: &N, patterns: &[u64]) -> Vec<u64> {
    let mut values = vec![0; network.node_count()];
    for (&node, &pattern) in network.inputs().iter().zip(patterns) {
        values[node] = pattern;
    }

    let mut fanins = Vec::with_capacity(N::ARITY);
    for node in 0..network.node_count() {
        if !network.is_gate(node) {
            continue;
        }
        fanins.clear();
        fanins.extend(network.fanins(node).iter().map(|&fanin| apply(values[fanin.node()], fanin)));
        values[node] = N::evaluate(&fanins);
    }

    values
}

/// Exhaustive truth tables of every primary output.
///
/// Output `o` is returned as `max(1, 2^n / 64)` words; bit `k` of the table is the output value under the input
/// assignment whose `i`-th bit is input `i`. Returns `None` when the network has more than
/// [`MAX_EXHAUSTIVE_INPUTS`] inputs.
#[must_use]
pub fn truth_tables<N: Network>(network: &N) -> Option<Vec<Vec<u64>>> {
    let inputs = network.inputs().len();
    if inputs > MAX_EXHAUSTIVE_INPUTS {
        return None;
    }

    let words = if inputs <= 6 { 1 } else { 1 << (inputs - 6) };
    let mask = table_mask(inputs);
    let mut tables = vec![Vec::with_capacity(words); network.outputs().len()];

    for word in 0..words {
        let patterns = (0..inputs)
            .map(|input| {
                if input < 6 {
                    var_mask(input)
                } else if (word >> (input - 6)) & 1 == 1 {
                    u64::MAX
                } else {
                    0
                }
            })
            .collect::<Vec<_>>();

        let values = simulate(network, &patterns);
        for (table, &output) in tables.iter_mut().zip(network.outputs()) {
            table.push(apply(values[output.node()], output) & mask);
        }
    }

    Some(tables)
}

/// Whether two networks with the same interface compute the same outputs.
///
/// Returns `None` if the interfaces differ or there are too many inputs to enumerate.
#[must_use]
pub fn equivalent<A: Network, B: Network>(a: &A, b: &B) -> Option<bool> {
    if a.inputs().len() != b.inputs().len() || a.outputs().len() != b.outputs().len() {
        return None;
    }
    Some(truth_tables(a)? == truth_tables(b)?)
}

/// Truth table of `root` as a function of `leaves` (at most six).
///
/// Every path from an input to `root` must pass through a leaf.
#[must_use]
pub fn cone_truth_table<N: Network>(network: &N, root: Signal, leaves: &[usize]) -> u64 {
    debug_assert!(leaves.len() <= 6);

    let mut values = leaves
        .iter()
        .enumerate()
        .map(|(var, &leaf)| (leaf, var_mask(var)))
        .collect::<HashMap<_, _>>();
    values.insert(0, 0);

    let mut cone = Vec::new();
    let mut stack = vec![root.node()];
    while let Some(node) = stack.pop() {
        if values.contains_key(&node) || cone.contains(&node) {
            continue;
        }
        cone.push(node);
        stack.extend(network.fanins(node).iter().map(|fanin| fanin.node()));
    }
    cone.sort_unstable();

    let mut fanins = Vec::with_capacity(N::ARITY);
    for node in cone {
        fanins.clear();
        fanins.extend(network.fanins(node).iter().map(|&fanin| apply(values[&fanin.node()], fanin)));
        values.insert(node, N::evaluate(&fanins));
    }

    apply(values[&root.node()], root) & table_mask(leaves.len())
}

/// Simulate a set of nodes over `leaves`, returning the truth table of each of them.
///
/// `nodes` must be closed under fanins down to the leaves, i.e. every fanin of a node in the set is either a leaf,
/// the constant, or itself in the set.
#[must_use]
pub fn window_truth_tables<N: Network>(network: &N, leaves: &[usize], nodes: &[usize]) -> HashMap<usize, u64> {
    let mask = table_mask(leaves.len());
    let mut values = leaves
        .iter()
        .enumerate()
        .map(|(var, &leaf)| (leaf, var_mask(var) & mask))
        .collect::<HashMap<_, _>>();
    values.insert(0, 0);

    let mut ordered = nodes.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut fanins = Vec::with_capacity(N::ARITY);
    for node in ordered {
        if values.contains_key(&node) {
            continue;
        }
        fanins.clear();
        fanins.extend(network.fanins(node).iter().map(|&fanin| apply(values[&fanin.node()], fanin)));
        values.insert(node, N::evaluate(&fanins) & mask);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::{cone_truth_table, equivalent, extend, table_mask, truth_tables, var_mask};
    use crate::traits::Builder;
    use crate::{Aig, Mig, Signal};

    #[test]
    fn extend_replicates_small_tables() {
        assert_eq!(extend(0b10, 1), var_mask(0));
        assert_eq!(extend(0b1000, 2), 0x8888_8888_8888_8888);
        assert_eq!(extend(0xF0, 3), var_mask(2));
        assert_eq!(table_mask(3), 0xFF);
    }

    #[test]
    fn majority_truth_table() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let m = mig.majority(a, b, c);
        mig.push_output(m);
        mig.push_output(!m);

        let tables = truth_tables(&mig).expect("three inputs is small");
        assert_eq!(tables[0], vec![0xE8]);
        assert_eq!(tables[1], vec![0x17]);
    }

    #[test]
    fn wide_networks_use_several_words() {
        let mut aig = Aig::new();
        let inputs = (0..8).map(|_| aig.add_input(None)).collect::<Vec<_>>();
        let all = inputs.iter().fold(Signal::TRUE, |acc, &input| aig.and(acc, input));
        aig.add_output(all, None);

        let tables = truth_tables(&aig).expect("eight inputs is small");
        assert_eq!(tables[0].len(), 4);
        assert_eq!(tables[0][..3], [0, 0, 0]);
        assert_eq!(tables[0][3], 1 << 63);
    }

    #[test]
    fn equivalence_of_and_forms() {
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let ab = aig.and(a, b);
        aig.add_output(ab, None);

        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let ab = mig.majority(a, b, Signal::FALSE);
        mig.push_output(ab);

        assert_eq!(equivalent(&aig, &mig), Some(true));

        let mut or = Mig::new();
        let a = or.push_input();
        let b = or.push_input();
        let a_or_b = or.majority(a, b, Signal::TRUE);
        or.push_output(a_or_b);
        assert_eq!(equivalent(&aig, &or), Some(false));
    }

    #[test]
    fn cone_stops_at_leaves() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let inner = mig.majority(a, b, Signal::FALSE);
        let top = mig.majority(inner, c, Signal::TRUE);

        // Over (inner, c) the top gate is a plain OR.
        let table = cone_truth_table(&mig, top, &[inner.node(), c.node()]);
        assert_eq!(table, 0b1110);
        // Over (a, b, c) it is ab + c.
        let table = cone_truth_table(&mig, top, &[a.node(), b.node(), c.node()]);
        assert_eq!(table, 0xF8);
    }
}
