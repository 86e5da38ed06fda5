//! Small-function synthesis.
//!
//! Functions of up to six variables are given as a `u64` truth table (see [`crate::sim::var_mask`]) and turned
//! into logic through a [`LogicBuilder`]. The cover is an irredundant sum of products computed with the
//! Minato-Morreale procedure, which is then algebraically factored. Functions that are exactly a majority of three
//! (possibly inverted) leaves become a single majority.

use std::cmp::Reverse;
use std::collections::HashMap;

use itertools::Itertools;

use crate::sim::{extend, var_mask};
use crate::traits::LogicBuilder;
use crate::Signal;

/// A product term: the variables in `mask`, each positive if its bit in `polarity` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cube {
    mask: u8,
    polarity: u8,
}

impl Cube {
    const TAUTOLOGY: Self = Self { mask: 0, polarity: 0 };

    /// Add a literal to this cube.
    #[must_use]
    const fn with(self, var: usize, positive: bool) -> Self {
        let bit = 1 << var;
        Self { mask: self.mask | bit, polarity: if positive { self.polarity | bit } else { self.polarity & !bit } }
    }

    /// Remove the literal of `var` from this cube.
    #[must_use]
    const fn without(self, var: usize) -> Self {
        let bit = !(1 << var);
        Self { mask: self.mask & bit, polarity: self.polarity & bit }
    }

    /// Whether `var` appears in this cube with the given polarity.
    #[must_use]
    pub const fn contains(self, var: usize, positive: bool) -> bool {
        let bit = 1 << var;
        self.mask & bit != 0 && (self.polarity & bit != 0) == positive
    }

    /// The number of literals in this cube.
    #[must_use]
    pub const fn literal_count(self) -> usize {
        self.mask.count_ones() as usize
    }

    /// The literals of this cube in variable order.
    pub fn literals(self) -> impl Iterator<Item = (usize, bool)> {
        (0..8).filter(move |var| self.mask & (1 << var) != 0).map(move |var| (var, self.polarity & (1 << var) != 0))
    }

    /// The truth table of this cube.
    #[must_use]
    pub fn truth_table(self) -> u64 {
        self.literals()
            .fold(u64::MAX, |acc, (var, positive)| acc & if positive { var_mask(var) } else { !var_mask(var) })
    }
}

fn cofactors(table: u64, var: usize) -> (u64, u64) {
    let shift = 1 << var;
    let mask = var_mask(var);
    let negative = table & !mask;
    let positive = table & mask;
    (negative | (negative << shift), positive | (positive >> shift))
}

/// Compute an irredundant sum of products `f` with `lower <= f <= upper`, returning the cover and its truth table.
///
/// Both bounds must be extended to the full word.
fn isop_between(lower: u64, upper: u64, vars: usize, cubes: &mut Vec<Cube>) -> u64 {
    if lower == 0 {
        return 0;
    }
    if upper == u64::MAX {
        cubes.push(Cube::TAUTOLOGY);
        return u64::MAX;
    }

    let Some(var) = (0..vars).rev().find(|&var| {
        let (l0, l1) = cofactors(lower, var);
        let (u0, u1) = cofactors(upper, var);
        l0 != l1 || u0 != u1
    }) else {
        // Independent of every variable, and neither zero nor one: lower and upper disagree on a constant.
        cubes.push(Cube::TAUTOLOGY);
        return u64::MAX;
    };

    let (lower0, lower1) = cofactors(lower, var);
    let (upper0, upper1) = cofactors(upper, var);

    let start = cubes.len();
    let result0 = isop_between(lower0 & !upper1, upper0, var, cubes);
    for cube in &mut cubes[start..] {
        *cube = cube.with(var, false);
    }

    let start = cubes.len();
    let result1 = isop_between(lower1 & !upper0, upper1, var, cubes);
    for cube in &mut cubes[start..] {
        *cube = cube.with(var, true);
    }

    let remaining = (lower0 & !result0) | (lower1 & !result1);
    let shared = isop_between(remaining, upper0 & upper1, var, cubes);

    let mask = var_mask(var);
    shared | (result0 & !mask) | (result1 & mask)
}

/// An irredundant sum-of-products cover of a completely specified function over `vars` variables.
#[must_use]
pub fn isop(table: u64, vars: usize) -> Vec<Cube> {
    let table = extend(table, vars);
    let mut cubes = Vec::new();
    isop_between(table, table, vars, &mut cubes);
    cubes
}

fn literal_count(cubes: &[Cube]) -> usize {
    cubes.iter().map(|cube| cube.literal_count()).sum()
}

fn leaf(leaves: &[Signal], var: usize, positive: bool) -> Signal {
    leaves[var].complement_if(!positive)
}

/// Build a cover as a factored form: repeatedly pull out the literal shared by the most cubes.
fn factor<B: LogicBuilder>(builder: &mut B, cubes: &[Cube], leaves: &[Signal]) -> Signal {
    if cubes.is_empty() {
        return Signal::FALSE;
    }
    if cubes.contains(&Cube::TAUTOLOGY) {
        return Signal::TRUE;
    }
    if let [cube] = cubes {
        return cube.literals().fold(Signal::TRUE, |acc, (var, positive)| builder.and(acc, leaf(leaves, var, positive)));
    }

    let best = (0..leaves.len())
        .cartesian_product([true, false])
        .map(|(var, positive)| (var, positive, cubes.iter().filter(|cube| cube.contains(var, positive)).count()))
        .max_by_key(|&(var, positive, count)| (count, Reverse(var), positive));

    match best {
        Some((var, positive, count)) if count > 1 => {
            let (with, without): (Vec<Cube>, Vec<Cube>) = cubes.iter().partition(|cube| cube.contains(var, positive));
            let with = with.into_iter().map(|cube| cube.without(var)).collect::<Vec<_>>();

            let quotient = factor(builder, &with, leaves);
            let divided = builder.and(leaf(leaves, var, positive), quotient);
            if without.is_empty() {
                divided
            } else {
                let remainder = factor(builder, &without, leaves);
                builder.or(divided, remainder)
            }
        }
        _ => cubes.iter().fold(Signal::FALSE, |acc, cube| {
            let product = factor(builder, std::slice::from_ref(cube), leaves);
            builder.or(acc, product)
        }),
    }
}

/// Combine `signals` with `op`, always joining the two shallowest first.
fn combine_balanced<B: LogicBuilder>(
    builder: &mut B,
    mut signals: Vec<Signal>,
    identity: Signal,
    op: impl Fn(&mut B, Signal, Signal) -> Signal,
) -> Signal {
    while signals.len() > 1 {
        signals.sort_by_key(|&signal| Reverse(builder.level(signal)));
        let (Some(a), Some(b)) = (signals.pop(), signals.pop()) else {
            unreachable!("at least two signals are left")
        };
        let joined = op(builder, a, b);
        signals.push(joined);
    }
    signals.pop().unwrap_or(identity)
}

/// If `table` is a majority of three leaves in some polarity, return the leaves (already complemented) and
/// whether the output must be inverted.
fn find_majority(table: u64, leaves: &[Signal]) -> Option<([Signal; 3], bool)> {
    let literal = |var: usize, inverted: bool| if inverted { !var_mask(var) } else { var_mask(var) };

    for (a, b, c) in (0..leaves.len()).tuple_combinations() {
        for polarity in 0..8u8 {
            let (pa, pb, pc) = (polarity & 1 != 0, polarity & 2 != 0, polarity & 4 != 0);
            let (x, y, z) = (literal(a, pa), literal(b, pb), literal(c, pc));
            let majority = (x & y) | (y & z) | (x & z);
            let signals = [leaves[a].complement_if(pa), leaves[b].complement_if(pb), leaves[c].complement_if(pc)];
            if majority == table {
                return Some((signals, false));
            }
            if majority == !table {
                return Some((signals, true));
            }
        }
    }

    None
}

/// Memoizes sum-of-products covers by function.
#[derive(Debug, Default)]
pub struct Synthesizer {
    covers: HashMap<(u64, usize), (Vec<Cube>, bool)>,
}

impl Synthesizer {
    /// Create a synthesizer with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The smaller of the covers of `table` and its complement, and whether it is the complement.
    pub fn cover(&mut self, table: u64, vars: usize) -> &(Vec<Cube>, bool) {
        let table = extend(table, vars);
        self.covers.entry((table, vars)).or_insert_with(|| {
            let on = isop(table, vars);
            let off = isop(!table, vars);
            if literal_count(&off) < literal_count(&on) {
                (off, true)
            } else {
                (on, false)
            }
        })
    }

    fn trivial(table: u64, leaves: &[Signal]) -> Option<Signal> {
        if table == 0 {
            return Some(Signal::FALSE);
        }
        if table == u64::MAX {
            return Some(Signal::TRUE);
        }
        (0..leaves.len()).find_map(|var| {
            if table == var_mask(var) {
                Some(leaves[var])
            } else if table == !var_mask(var) {
                Some(!leaves[var])
            } else {
                None
            }
        })
    }

    /// Build `table` over `leaves` (at most six) with as few gates as the factored cover allows.
    pub fn synthesize<B: LogicBuilder>(&mut self, builder: &mut B, table: u64, leaves: &[Signal]) -> Signal {
        debug_assert!(leaves.len() <= 6);
        let table = extend(table, leaves.len());

        if let Some(signal) = Self::trivial(table, leaves) {
            return signal;
        }
        if let Some(([a, b, c], inverted)) = find_majority(table, leaves) {
            return builder.majority(a, b, c).complement_if(inverted);
        }

        let (cubes, inverted) = self.cover(table, leaves.len());
        factor(builder, cubes, leaves).complement_if(*inverted)
    }

    /// Build `table` over `leaves` as a two-level sum of products whose products and sum are joined
    /// shallowest-first, so the result is as shallow as the leaf levels allow.
    ///
    /// Returns `None` if the cover has more than `max_cubes` products.
    pub fn synthesize_balanced<B: LogicBuilder>(
        &mut self,
        builder: &mut B,
        table: u64,
        leaves: &[Signal],
        max_cubes: usize,
    ) -> Option<Signal> {
        debug_assert!(leaves.len() <= 6);
        let table = extend(table, leaves.len());

        if let Some(signal) = Self::trivial(table, leaves) {
            return Some(signal);
        }

        let (cubes, inverted) = self.cover(table, leaves.len()).clone();
        if cubes.len() > max_cubes {
            return None;
        }

        let products = cubes
            .iter()
            .map(|cube| {
                let literals = cube.literals().map(|(var, positive)| leaf(leaves, var, positive)).collect();
                combine_balanced(builder, literals, Signal::TRUE, |b, x, y| b.and(x, y))
            })
            .collect();
        let sum = combine_balanced(builder, products, Signal::FALSE, |b, x, y| b.or(x, y));

        Some(sum.complement_if(inverted))
    }
}

/// Build `table` over `leaves` with a throwaway [`Synthesizer`].
pub fn synthesize<B: LogicBuilder>(builder: &mut B, table: u64, leaves: &[Signal]) -> Signal {
    Synthesizer::new().synthesize(builder, table, leaves)
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rstest::rstest;

    use super::{isop, synthesize, Cube, Synthesizer};
    use crate::sim::{cone_truth_table, extend, table_mask, var_mask};
    use crate::traits::{Builder, Network};
    use crate::view::LevelledNetwork;
    use crate::{Aig, Mig, Signal};

    fn cover_table(cubes: &[Cube]) -> u64 {
        cubes.iter().fold(0, |acc, cube| acc | cube.truth_table())
    }

    #[rstest]
    #[case(0xE8, 3, 3)]
    #[case(0x8, 2, 1)]
    #[case(0x6, 2, 2)]
    #[case(0x6996, 4, 8)]
    #[case(0xFE, 3, 3)]
    fn isop_covers_exactly(#[case] table: u64, #[case] vars: usize, #[case] cubes: usize) {
        let cover = isop(table, vars);
        assert_eq!(cover_table(&cover), extend(table, vars));
        assert_eq!(cover.len(), cubes);
    }

    #[test]
    fn isop_constants() {
        assert!(isop(0, 3).is_empty());
        assert_eq!(isop(0xFF, 3), vec![Cube::TAUTOLOGY]);
    }

    quickcheck! {
        fn isop_is_exact(table: u64) -> bool {
            cover_table(&isop(table, 6)) == table
        }

        fn synthesized_aig_matches(table: u16) -> bool {
            let mut aig = Aig::new();
            let leaves = (0..4).map(|_| aig.add_input(None)).collect::<Vec<_>>();
            let root = synthesize(&mut aig, u64::from(table), &leaves);
            let nodes = leaves.iter().map(|leaf| leaf.node()).collect::<Vec<_>>();
            cone_truth_table(&aig, root, &nodes) == u64::from(table) & table_mask(4)
        }

        fn synthesized_mig_matches(table: u64) -> bool {
            let mut mig = Mig::new();
            let leaves = (0..6).map(|_| mig.add_input(None)).collect::<Vec<_>>();
            let root = synthesize(&mut mig, table, &leaves);
            let nodes = leaves.iter().map(|leaf| leaf.node()).collect::<Vec<_>>();
            cone_truth_table(&mig, root, &nodes) == table
        }
    }

    #[test]
    fn majority_is_one_gate() {
        let mut mig = Mig::new();
        let leaves = (0..3).map(|_| mig.add_input(None)).collect::<Vec<_>>();
        // M(a, b', c)
        let table = (var_mask(0) & !var_mask(1)) | (!var_mask(1) & var_mask(2)) | (var_mask(0) & var_mask(2));
        let root = synthesize(&mut mig, table, &leaves);
        assert_eq!(mig.gate_count(), 1);
        assert_eq!(mig.try_unwrap_majority(root.node()).map(|fanins| fanins.len()), Some(3));
    }

    #[test]
    fn majority_as_ands_takes_four_gates() {
        let mut aig = Aig::new();
        let leaves = (0..3).map(|_| aig.add_input(None)).collect::<Vec<_>>();
        synthesize(&mut aig, 0xE8, &leaves);
        assert_eq!(aig.gate_count(), 4);
    }

    #[test]
    fn trivial_functions_create_nothing() {
        let mut aig = Aig::new();
        let leaves = (0..2).map(|_| aig.add_input(None)).collect::<Vec<_>>();
        assert_eq!(synthesize(&mut aig, 0, &leaves), Signal::FALSE);
        assert_eq!(synthesize(&mut aig, 0xF, &leaves), Signal::TRUE);
        assert_eq!(synthesize(&mut aig, 0xA, &leaves), leaves[0]);
        assert_eq!(synthesize(&mut aig, 0x3, &leaves), !leaves[1]);
        assert_eq!(aig.gate_count(), 0);
    }

    #[test]
    fn balanced_and_is_logarithmic() {
        let mut aig = Aig::new();
        let leaves = (0..4).map(|_| aig.add_input(None)).collect::<Vec<_>>();
        let mut levelled = LevelledNetwork::new(aig);
        let table = var_mask(0) & var_mask(1) & var_mask(2) & var_mask(3);

        let root = Synthesizer::new()
            .synthesize_balanced(&mut levelled, table, &leaves, 8)
            .expect("a single cube is below the cap");
        assert_eq!(levelled.signal_level(root), 2);
    }

    #[test]
    fn balanced_respects_cube_cap() {
        let mut aig = Aig::new();
        let leaves = (0..4).map(|_| aig.add_input(None)).collect::<Vec<_>>();
        // Four-input parity needs eight cubes in either polarity.
        assert_eq!(Synthesizer::new().synthesize_balanced(&mut aig, 0x6996, &leaves, 4), None);
    }
}
