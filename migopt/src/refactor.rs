//! Cone refactoring.
//!
//! Every gate's fanout-free fanin cone is collapsed into a truth table over its leaves and synthesized again from
//! scratch. The new structure replaces the cone when it needs no more gates than the cone held.

use tracing::{debug, info};

use crate::config::RefactorParams;
use crate::cut::reconvergent_cone;
use crate::mig::Mig;
use crate::sim::cone_truth_table;
use crate::synth::Synthesizer;
use crate::traits::{translate, LogicBuilder, Network};
use crate::view::{DepthView, FanoutView};
use crate::Signal;

/// Refactor `mig`, returning it unchanged if the result would have more gates.
#[must_use]
pub fn refactor(mig: Mig, params: &RefactorParams) -> Mig {
    let before = (mig.gate_count(), DepthView::new(&mig).depth());
    let max_leaves = params.max_leaves.min(6);
    let mut synthesizer = Synthesizer::new();
    let mut accepted = 0usize;

    let candidate = {
        let fanout = FanoutView::new(&mig);

        mig.rebuild(|network, map, node, fanins| {
            let cone = reconvergent_cone(&mig, node, max_leaves, |leaf| fanout.fanout_count(leaf) == 1);
            // A lone gate is already as small as it gets.
            if cone.nodes.len() == 1 {
                return network.majority(fanins[0], fanins[1], fanins[2]);
            }

            let table = cone_truth_table(&mig, Signal::from_node(node), &cone.leaves);
            let leaves = cone.leaves.iter().map(|&leaf| translate(map, Signal::from_node(leaf))).collect::<Vec<_>>();

            let existing = network.len();
            let replacement = synthesizer.synthesize(network, table, &leaves);
            let added = network.len() - existing;

            let saved = cone.nodes.len();
            if saved > added || (saved == added && params.allow_zero_gain) {
                if saved > added {
                    accepted += 1;
                }
                replacement
            } else {
                network.majority(fanins[0], fanins[1], fanins[2])
            }
        })
    };

    let after = (candidate.gate_count(), DepthView::new(&candidate).depth());
    debug!(accepted, gates = after.0, "refactor candidate");

    let result = if after.0 <= before.0 { candidate } else { mig };
    info!(
        gates_before = before.0,
        depth_before = before.1,
        gates_after = result.gate_count(),
        depth_after = DepthView::new(&result).depth(),
        "refactor"
    );
    result
}
