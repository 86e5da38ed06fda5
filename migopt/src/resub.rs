//! Window-based resubstitution.
//!
//! For each gate a small window is cut out below it and simulated exhaustively. Signals that already exist in the
//! window (divisors) are then combined, with at most `max_inserts` new gates, to find a cheaper implementation of
//! the gate. Only nodes created before the gate are divisors, so a replacement can never close a cycle.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::ResubParams;
use crate::cut::reconvergent_cone;
use crate::mig::Mig;
use crate::sim::{table_mask, window_truth_tables};
use crate::traits::{translate, LogicBuilder, Network};
use crate::view::{DepthView, FanoutView, LevelledNetwork};
use crate::Signal;

/// A divisor: an old node, its function over the window leaves, and the signal it maps to in the new network.
#[derive(Clone, Copy, Debug)]
struct Divisor {
    table: u64,
    signal: Signal,
}

impl Divisor {
    fn complement_if(self, complement: bool, mask: u64) -> Self {
        if complement {
            Self { table: !self.table & mask, signal: !self.signal }
        } else {
            self
        }
    }
}

/// Ways to rebuild a gate from divisors.
#[derive(Clone, Copy, Debug)]
enum Resubstitution {
    /// An existing signal.
    Zero(Signal),
    /// `M(a, b, c)` of existing signals.
    One([Signal; 3]),
    /// `M(a, b, M(c, d, constant))` of existing signals.
    Two([Signal; 2], [Signal; 3]),
}

impl Resubstitution {
    const fn inserts(self) -> usize {
        match self {
            Self::Zero(_) => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }

    fn level(self, network: &LevelledNetwork<Mig>) -> usize {
        let deepest = |signals: &[Signal]| signals.iter().map(|&signal| network.level(signal)).max().unwrap_or(0);
        match self {
            Self::Zero(signal) => network.level(signal),
            Self::One(fanins) => 1 + deepest(&fanins),
            Self::Two(outer, inner) => 1 + deepest(&outer).max(1 + deepest(&inner)),
        }
    }

    fn build(self, network: &mut LevelledNetwork<Mig>) -> Signal {
        match self {
            Self::Zero(signal) => signal,
            Self::One([a, b, c]) => network.majority(a, b, c),
            Self::Two([a, b], [c, d, e]) => {
                let inner = network.majority(c, d, e);
                network.majority(a, b, inner)
            }
        }
    }
}

fn majority(a: u64, b: u64, c: u64) -> u64 {
    (a & b) | (b & c) | (a & c)
}

/// Pairs `(a, b)` (in some polarity) that can be the first two inputs of a majority equal to `target`: wherever `a`
/// and `b` agree, they must agree with `target`.
fn compatible_pairs(divisors: &[Divisor], target: u64, mask: u64) -> Vec<(Divisor, Divisor)> {
    let mut pairs = Vec::new();
    for (i, &a) in divisors.iter().enumerate() {
        for &b in &divisors[i + 1..] {
            for polarity in 0..4 {
                let a = a.complement_if(polarity & 1 != 0, mask);
                let b = b.complement_if(polarity & 2 != 0, mask);
                let agree = !(a.table ^ b.table) & mask;
                if (a.table ^ target) & agree == 0 {
                    pairs.push((a, b));
                }
            }
        }
    }
    pairs
}

fn find(divisors: &[Divisor], target: u64, mask: u64, max_inserts: usize) -> Option<Resubstitution> {
    for divisor in divisors {
        if divisor.table == target {
            return Some(Resubstitution::Zero(divisor.signal));
        }
        if divisor.table == !target & mask {
            return Some(Resubstitution::Zero(!divisor.signal));
        }
    }

    if max_inserts == 0 {
        return None;
    }

    let pairs = compatible_pairs(divisors, target, mask);

    // M(a, b, c) = target iff c matches target wherever a and b disagree.
    for &(a, b) in &pairs {
        let disagree = (a.table ^ b.table) & mask;
        for &c in divisors {
            for complement in [false, true] {
                let c = c.complement_if(complement, mask);
                if (c.table ^ target) & disagree == 0 {
                    debug_assert_eq!(majority(a.table, b.table, c.table) & mask, target);
                    return Some(Resubstitution::One([a.signal, b.signal, c.signal]));
                }
            }
        }
    }

    if max_inserts < 2 {
        return None;
    }

    for &(a, b) in &pairs {
        let disagree = (a.table ^ b.table) & mask;
        for (i, &c) in divisors.iter().enumerate() {
            for &d in &divisors[i + 1..] {
                for polarity in 0..8 {
                    let c = c.complement_if(polarity & 1 != 0, mask);
                    let d = d.complement_if(polarity & 2 != 0, mask);
                    let (table, constant) = if polarity & 4 == 0 {
                        (c.table & d.table, Signal::FALSE)
                    } else {
                        ((c.table | d.table) & mask, Signal::TRUE)
                    };
                    if (table ^ target) & disagree == 0 {
                        return Some(Resubstitution::Two([a.signal, b.signal], [c.signal, d.signal, constant]));
                    }
                }
            }
        }
    }

    None
}

/// Try to resubstitute `node`, returning the replacement if it saves at least one gate.
fn resubstitute(
    mig: &Mig,
    fanout: &FanoutView<Mig>,
    network: &mut LevelledNetwork<Mig>,
    map: &[Signal],
    node: usize,
    current_level: usize,
    params: &ResubParams,
) -> Option<Signal> {
    let freed: HashSet<usize> = fanout.mffc(node).into_iter().collect();
    // A replacement must add fewer gates than it frees.
    let max_inserts = params.max_inserts.min(2).min(freed.len() - 1);

    let window = reconvergent_cone(mig, node, params.max_leaves.min(6), |_| true);
    let mask = table_mask(window.leaves.len());

    // Side nodes: gates outside the window, created before `node`, whose fanins all lie in the window.
    let mut simulated = window.nodes.clone();
    let mut known: HashSet<usize> = window.leaves.iter().chain(&window.nodes).copied().collect();
    known.insert(0);
    let mut frontier = window.leaves.iter().chain(&window.nodes).copied().collect::<Vec<_>>();
    let mut side = 0;
    while let Some(candidate) = frontier.pop() {
        for &consumer in fanout.consumers(candidate) {
            if consumer >= node || known.contains(&consumer) || side >= params.max_divisors {
                continue;
            }
            if mig.fanins(consumer).iter().all(|fanin| known.contains(&fanin.node())) {
                known.insert(consumer);
                simulated.push(consumer);
                frontier.push(consumer);
                side += 1;
            }
        }
    }

    let tables = window_truth_tables(mig, &window.leaves, &simulated);
    let target = tables[&node] & mask;

    let mut divisors = vec![Divisor { table: 0, signal: Signal::FALSE }];
    divisors.extend(
        window
            .leaves
            .iter()
            .chain(&simulated)
            .copied()
            .filter(|candidate| *candidate != node && !freed.contains(candidate))
            .take(params.max_divisors)
            .map(|divisor| Divisor {
                table: tables[&divisor] & mask,
                signal: translate(map, Signal::from_node(divisor)),
            }),
    );

    let found = find(&divisors, target, mask, max_inserts)?;
    if found.inserts() >= freed.len() {
        return None;
    }
    if params.preserve_depth && found.level(network) > current_level {
        return None;
    }

    Some(found.build(network))
}

/// Resubstitute gates of `mig`, returning it unchanged if the result would be larger (or deeper, when depth is
/// preserved).
#[must_use]
pub fn resub(mig: Mig, params: &ResubParams) -> Mig {
    let before = (mig.gate_count(), DepthView::new(&mig).depth());
    let mut replaced = 0usize;

    let candidate = {
        let fanout = FanoutView::new(&mig);

        mig.rebuild(|network, map, node, fanins| {
            let current_level = 1 + fanins.iter().map(|&fanin| network.level(fanin)).max().unwrap_or(0);
            if let Some(signal) = resubstitute(&mig, &fanout, network, map, node, current_level, params) {
                replaced += 1;
                signal
            } else {
                network.majority(fanins[0], fanins[1], fanins[2])
            }
        })
    };

    let after = (candidate.gate_count(), DepthView::new(&candidate).depth());
    debug!(replaced, gates = after.0, depth = after.1, "resub candidate");

    let accept = after.0 <= before.0 && (!params.preserve_depth || after.1 <= before.1);
    let result = if accept { candidate } else { mig };
    info!(
        gates_before = before.0,
        depth_before = before.1,
        gates_after = result.gate_count(),
        depth_after = DepthView::new(&result).depth(),
        "resub"
    );
    result
}
