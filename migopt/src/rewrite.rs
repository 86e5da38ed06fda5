//! Depth-oriented algebraic rewriting.
//!
//! Two majority axioms are used to pull late-arriving signals towards the outputs:
//!
//! - Associativity: `M(x, u, M(y, u, z)) = M(z, u, M(y, u, x))`. If `z` is the deepest input of the child and `x` is
//!   shallow, swapping them takes one level off the path through `z`. The child is replaced, so this never adds a
//!   gate when the child has no other fanout.
//! - Distributivity: `M(x, y, M(u, v, z)) = M(z, M(x, y, u), M(x, y, v))`. This also shortens the path through `z`
//!   but costs a gate, so it is only tried when area may increase.

use tracing::{debug, info};

use crate::config::RewriteParams;
use crate::mig::Mig;
use crate::traits::{LogicBuilder, Network};
use crate::view::{DepthView, FanoutView, LevelledNetwork};
use crate::Signal;

/// The children of `signal` as seen through its inverter, if it is a majority gate.
fn children(network: &LevelledNetwork<Mig>, signal: Signal) -> Option<[Signal; 3]> {
    let fanins = network.network().try_unwrap_majority(signal.node())?;
    Some(fanins.map(|fanin| fanin.complement_if(signal.is_complemented())))
}

/// The two entries of `signals` other than the one at `index`.
const fn others(signals: [Signal; 3], index: usize) -> [Signal; 2] {
    match index {
        0 => [signals[1], signals[2]],
        1 => [signals[0], signals[2]],
        _ => [signals[0], signals[1]],
    }
}

fn level_of(network: &LevelledNetwork<Mig>, signals: &[Signal]) -> usize {
    signals.iter().map(|&signal| network.level(signal)).max().unwrap_or(0)
}

/// Try `M(x, u, M(y, u, z)) -> M(z, u, M(y, u, x))` with the child at `index`.
fn associate(network: &mut LevelledNetwork<Mig>, fanins: [Signal; 3], index: usize) -> Option<Signal> {
    let child = fanins[index];
    let grandchildren = children(network, child)?;
    let current = 1 + level_of(network, &fanins);

    let [first, second] = others(fanins, index);
    for (u, x) in [(first, second), (second, first)] {
        let Some(shared) = grandchildren.iter().position(|&grandchild| grandchild == u) else {
            continue;
        };
        let [mut y, mut z] = others(grandchildren, shared);
        if network.level(y) > network.level(z) {
            std::mem::swap(&mut y, &mut z);
        }

        let inner = 1 + level_of(network, &[y, u, x]);
        let predicted = 1 + network.level(z).max(network.level(u)).max(inner);
        if predicted < current {
            let inner = network.majority(y, u, x);
            return Some(network.majority(z, u, inner));
        }
    }

    None
}

/// Try `M(x, y, M(u, v, z)) -> M(z, M(x, y, u), M(x, y, v))` with the child at `index`.
fn distribute(network: &mut LevelledNetwork<Mig>, fanins: [Signal; 3], index: usize) -> Option<Signal> {
    let child = fanins[index];
    let grandchildren = children(network, child)?;
    let current = 1 + level_of(network, &fanins);
    let [x, y] = others(fanins, index);

    let deepest = (0..3).max_by_key(|&i| network.level(grandchildren[i]))?;
    let z = grandchildren[deepest];
    let [u, v] = others(grandchildren, deepest);

    let left = 1 + level_of(network, &[x, y, u]);
    let right = 1 + level_of(network, &[x, y, v]);
    let predicted = 1 + network.level(z).max(left).max(right);
    if predicted < current {
        let left = network.majority(x, y, u);
        let right = network.majority(x, y, v);
        return Some(network.majority(z, left, right));
    }

    None
}

fn rewrite_once(mig: &Mig, params: &RewriteParams) -> Mig {
    let fanout = FanoutView::new(mig);
    let depth = DepthView::new(mig);

    mig.rebuild(|network, _, node, fanins| {
        let original = mig.fanins(node);

        // Children in decreasing order of depth, so the critical one is tried first.
        let mut order = [0, 1, 2];
        order.sort_by_key(|&i| std::cmp::Reverse(depth.level(original[i].node())));

        for index in order {
            let child = original[index].node();
            if !mig.is_gate(child) {
                continue;
            }
            let exclusive = fanout.fanout_count(child) == 1;

            if exclusive || params.allow_area_increase {
                if let Some(signal) = associate(network, fanins, index) {
                    return signal;
                }
            }
            if params.allow_area_increase {
                if let Some(signal) = distribute(network, fanins, index) {
                    return signal;
                }
            }
        }

        network.majority(fanins[0], fanins[1], fanins[2])
    })
}

/// Whether `candidate` may replace `current`.
fn improves(current: (usize, usize), candidate: (usize, usize), params: &RewriteParams) -> bool {
    let (gates, depth) = current;
    let (new_gates, new_depth) = candidate;
    if params.allow_area_increase {
        new_depth < depth || (new_depth == depth && new_gates < gates)
    } else {
        new_gates <= gates && new_depth <= depth && (new_gates, new_depth) != (gates, depth)
    }
}

/// Rewrite `mig` with majority algebra to reduce its depth.
///
/// Each sweep over the network is committed only if it improves the network; without `allow_area_increase` that
/// means neither gate count nor depth grows.
#[must_use]
pub fn rewrite(mig: Mig, params: &RewriteParams) -> Mig {
    let metrics = |mig: &Mig| (mig.gate_count(), DepthView::new(mig).depth());
    let before = metrics(&mig);
    let mut current = mig;
    let mut current_metrics = before;

    for iteration in 0..params.max_iterations {
        let candidate = rewrite_once(&current, params);
        let candidate_metrics = metrics(&candidate);
        if !improves(current_metrics, candidate_metrics, params) {
            break;
        }
        debug!(iteration, gates = candidate_metrics.0, depth = candidate_metrics.1, "rewrite committed");
        current = candidate;
        current_metrics = candidate_metrics;
    }

    info!(
        gates_before = before.0,
        depth_before = before.1,
        gates_after = current_metrics.0,
        depth_after = current_metrics.1,
        "rewrite"
    );
    current
}
