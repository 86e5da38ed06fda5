//! k-feasible cut enumeration.
//!
//! A cut of a node is a set of leaves such that every path from an input to the node passes through a leaf. Cuts
//! are computed bottom-up by merging the cuts of the fanins, and each one carries the truth table of the node as a
//! function of its leaves.

use itertools::Itertools;

use crate::sim::{extend, table_mask, var_mask};
use crate::traits::Network;

/// Limits on cut enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutParams {
    /// Maximum number of leaves in a cut (at most six).
    pub cut_size: usize,
    /// Maximum number of non-trivial cuts kept per node.
    pub max_cuts: usize,
}

impl Default for CutParams {
    fn default() -> Self {
        Self { cut_size: 4, max_cuts: 8 }
    }
}

/// A cut: sorted leaf nodes and the root's function over them.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Cut {
    leaves: Vec<usize>,
    truth: u64,
}

impl Cut {
    /// The cut consisting of just `node`.
    #[must_use]
    pub fn trivial(node: usize) -> Self {
        if node == 0 {
            Self { leaves: Vec::new(), truth: 0 }
        } else {
            Self { leaves: vec![node], truth: extend(var_mask(0), 1) }
        }
    }

    /// The leaves of this cut, in increasing node order.
    #[must_use]
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// The function of the root over [`Self::leaves`].
    #[must_use]
    pub const fn truth(&self) -> u64 {
        self.truth
    }

    /// Whether this is the trivial cut of `node`.
    #[must_use]
    pub fn is_trivial_for(&self, node: usize) -> bool {
        self.leaves == [node]
    }

    /// Whether every leaf of `self` is also a leaf of `rhs`.
    #[must_use]
    pub fn dominates(&self, rhs: &Self) -> bool {
        self.leaves.iter().all(|leaf| rhs.leaves.binary_search(leaf).is_ok())
    }
}

/// Re-express a truth table over `from` as one over `to`, which must be a superset of `from`.
fn stretch(table: u64, from: &[usize], to: &[usize]) -> u64 {
    let positions = from.iter().filter_map(|leaf| to.binary_search(leaf).ok()).collect::<Vec<_>>();

    let mut stretched = 0;
    for minterm in 0..1u64 << to.len() {
        let index = positions
            .iter()
            .enumerate()
            .filter(|&(_, &position)| (minterm >> position) & 1 == 1)
            .fold(0, |index, (var, _)| index | (1 << var));
        if (table >> index) & 1 == 1 {
            stretched |= 1 << minterm;
        }
    }

    extend(stretched, to.len())
}

/// Enumerate cuts for every node of `network`.
///
/// Each node's list holds up to `max_cuts` non-dominated cuts, smallest first, followed by the trivial cut.
#[must_use]
pub fn enumerate_cuts<N: Network>(network: &N, params: &CutParams) -> Vec<Vec<Cut>> {
    let mut cuts: Vec<Vec<Cut>> = Vec::with_capacity(network.node_count());

    for node in 0..network.node_count() {
        if !network.is_gate(node) {
            cuts.push(vec![Cut::trivial(node)]);
            continue;
        }

        let fanins = network.fanins(node);

        // Merge one fanin at a time, keeping the chosen cut of each fanin alongside the merged leaves.
        let mut partial: Vec<(Vec<usize>, Vec<&Cut>)> = vec![(Vec::new(), Vec::new())];
        for fanin in fanins {
            partial = partial
                .iter()
                .cartesian_product(&cuts[fanin.node()])
                .map(|((leaves, chosen), cut)| {
                    let leaves = leaves.iter().merge(&cut.leaves).dedup().copied().collect::<Vec<_>>();
                    let mut chosen = chosen.clone();
                    chosen.push(cut);
                    (leaves, chosen)
                })
                .filter(|(leaves, _)| leaves.len() <= params.cut_size)
                .collect();
        }

        let candidates = partial
            .into_iter()
            .map(|(leaves, chosen)| {
                let values = chosen
                    .iter()
                    .zip(fanins)
                    .map(|(cut, fanin)| {
                        let value = stretch(cut.truth, &cut.leaves, &leaves);
                        if fanin.is_complemented() {
                            !value
                        } else {
                            value
                        }
                    })
                    .collect::<Vec<_>>();
                let truth = extend(N::evaluate(&values) & table_mask(leaves.len()), leaves.len());
                Cut { leaves, truth }
            })
            .unique()
            .collect::<Vec<_>>();

        let mut node_cuts = candidates
            .iter()
            .filter(|candidate| {
                !candidates.iter().any(|cut| cut.leaves != candidate.leaves && cut.dominates(candidate))
            })
            .sorted_by_key(|cut| cut.leaves.len())
            .take(params.max_cuts)
            .cloned()
            .collect::<Vec<_>>();
        node_cuts.push(Cut::trivial(node));

        cuts.push(node_cuts);
    }

    cuts
}

/// A window around a root: the leaves below it and the nodes between the leaves and the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cone {
    /// Leaf nodes, in increasing order. Never contains the constant.
    pub leaves: Vec<usize>,
    /// The root and every expanded node, root first.
    pub nodes: Vec<usize>,
}

/// Grow a cone from `root` by repeatedly expanding the leaf that adds the fewest new leaves, as long as the cone
/// has at most `max_leaves` leaves. Only leaves for which `admit` holds are expanded.
///
/// Preferring cheap expansions captures reconvergent paths, where a node's fanins are already leaves.
pub fn reconvergent_cone<N: Network>(
    network: &N,
    root: usize,
    max_leaves: usize,
    admit: impl Fn(usize) -> bool,
) -> Cone {
    let mut nodes = vec![root];
    let mut leaves =
        network.fanins(root).iter().map(|fanin| fanin.node()).filter(|&node| node != 0).collect::<Vec<_>>();
    leaves.sort_unstable();
    leaves.dedup();

    let added = |leaves: &[usize], nodes: &[usize], leaf: usize| {
        network
            .fanins(leaf)
            .iter()
            .map(|fanin| fanin.node())
            .filter(|&node| node != 0 && leaves.binary_search(&node).is_err() && !nodes.contains(&node))
            .unique()
            .count()
    };

    loop {
        let best = leaves
            .iter()
            .copied()
            .filter(|&leaf| network.is_gate(leaf) && admit(leaf))
            .map(|leaf| (leaf, added(&leaves, &nodes, leaf)))
            .filter(|&(_, added)| leaves.len() - 1 + added <= max_leaves)
            .min_by_key(|&(leaf, added)| (added, std::cmp::Reverse(leaf)));

        let Some((leaf, _)) = best else {
            break;
        };

        leaves.retain(|&node| node != leaf);
        nodes.push(leaf);
        for fanin in network.fanins(leaf) {
            let node = fanin.node();
            if node != 0 && !nodes.contains(&node) {
                if let Err(position) = leaves.binary_search(&node) {
                    leaves.insert(position, node);
                }
            }
        }
    }

    Cone { leaves, nodes }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{enumerate_cuts, reconvergent_cone, stretch, Cut, CutParams};
    use crate::sim::{cone_truth_table, extend};
    use crate::traits::Builder;
    use crate::{Aig, Signal};

    /// out = (a & b) & (c & d)
    fn and4() -> (Aig, [Signal; 3]) {
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let c = aig.add_input(None);
        let d = aig.add_input(None);
        let ab = aig.and(a, b);
        let cd = aig.and(c, !d);
        let out = aig.and(ab, cd);
        aig.add_output(out, None);
        (aig, [ab, cd, out])
    }

    #[test]
    fn stretch_inserts_variables() {
        // x over [5] becomes the second variable over [3, 5].
        assert_eq!(stretch(0b10, &[5], &[3, 5]), extend(0b1100, 2));
        assert_eq!(stretch(0b1000, &[3, 5], &[3, 4, 5]), extend(0b1010_0000, 3));
    }

    #[rstest]
    #[case(4, 5)]
    #[case(3, 4)]
    #[case(2, 2)]
    fn cut_size_limits_cuts(#[case] cut_size: usize, #[case] expected: usize) {
        let (aig, [_, _, out]) = and4();
        let cuts = enumerate_cuts(&aig, &CutParams { cut_size, max_cuts: 8 });
        // Every list ends with the trivial cut.
        assert!(cuts[out.node()].last().is_some_and(|cut| cut.is_trivial_for(out.node())));
        assert_eq!(cuts[out.node()].len(), expected);
    }

    #[test]
    fn cut_functions_match_simulation() {
        let (aig, [_, _, out]) = and4();
        let cuts = enumerate_cuts(&aig, &CutParams::default());

        for cut in &cuts[out.node()] {
            let table = cone_truth_table(&aig, out, cut.leaves());
            assert_eq!(extend(table, cut.leaves().len()), cut.truth(), "cut {:?}", cut.leaves());
        }
    }

    #[test]
    fn cone_expands_to_inputs() {
        let (aig, [ab, cd, out]) = and4();
        let cone = reconvergent_cone(&aig, out.node(), 4, |_| true);
        assert_eq!(cone.leaves, vec![1, 2, 3, 4]);
        assert_eq!(cone.nodes.len(), 3);
        assert_eq!(cone.nodes[0], out.node());

        // With room for three leaves only one side can be opened.
        let cone = reconvergent_cone(&aig, out.node(), 3, |_| true);
        assert_eq!(cone.leaves.len(), 3);
        assert!(cone.leaves.contains(&ab.node()) != cone.leaves.contains(&cd.node()));

        // Nothing may be expanded.
        let cone = reconvergent_cone(&aig, out.node(), 6, |_| false);
        assert_eq!(cone.leaves, vec![ab.node(), cd.node()]);
    }

    #[test]
    fn reconvergence_is_cheap() {
        // top = (a & b) & (a & !c): expanding either side re-uses a leaf.
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let c = aig.add_input(None);
        let left = aig.and(a, b);
        let right = aig.and(a, !c);
        let top = aig.and(left, right);
        aig.add_output(top, None);

        let cone = reconvergent_cone(&aig, top.node(), 3, |_| true);
        assert_eq!(cone.leaves, vec![a.node(), b.node(), c.node()]);
    }

    #[test]
    fn constants_have_no_leaves() {
        let cut = Cut::trivial(0);
        assert!(cut.leaves().is_empty());
        assert_eq!(cut.truth(), 0);
    }

    #[test]
    fn dominance() {
        let small = Cut { leaves: vec![1, 2], truth: 0 };
        let large = Cut { leaves: vec![1, 2, 3], truth: 0 };
        assert!(small.dominates(&large));
        assert!(!large.dominates(&small));
    }
}
