//! Cut-based rebalancing.
//!
//! The majority graph is exported to an and-inverter graph, every gate is rebuilt from the shallowest sum of
//! products among its cuts, and the result is imported again. Which cuts are tried, and what happens afterwards,
//! depends on the size of the network: see [`BalanceParams`].

use tracing::{debug, info};

use crate::config::{BalanceConfig, BalanceParams, Cleanup, RewriteParams};
use crate::convert::{aig_to_mig, mig_to_aig};
use crate::cut::{enumerate_cuts, CutParams};
use crate::error::Result;
use crate::rewrite::rewrite;
use crate::synth::Synthesizer;
use crate::traits::{translate, Builder, LogicBuilder, Network};
use crate::view::{DepthView, LevelledNetwork};
use crate::{Aig, Mig, Signal};

/// Rebuilds an and-inverter graph with less depth.
pub trait RebalancingStrategy {
    /// Return a network equivalent to `aig`, rebalanced according to `config`.
    fn rebalance(&mut self, aig: &Aig, config: &BalanceConfig) -> Aig;
}

/// Rebalancing by sum-of-products resynthesis of k-feasible cuts.
///
/// For each gate (or only for those on a critical path) every cut is turned into a two-level cover whose products
/// and sum are built shallowest-first. The candidate with the lowest level wins, ties going to the one that adds
/// fewer gates; the plain AND of the gate's fanins is always a candidate.
#[derive(Debug, Default)]
pub struct SopRebalancing {
    synthesizer: Synthesizer,
}

impl SopRebalancing {
    /// Create a strategy with an empty cover cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RebalancingStrategy for SopRebalancing {
    fn rebalance(&mut self, aig: &Aig, config: &BalanceConfig) -> Aig {
        let cuts = enumerate_cuts(aig, &CutParams { cut_size: config.cut_size.min(6), max_cuts: config.max_cuts });
        let critical = config.only_on_critical_path.then(|| DepthView::new(aig).critical_nodes());

        let (network, mut map) = Aig::clone_interface(aig);
        let mut network = LevelledNetwork::new(network);
        let mut improved = 0usize;

        for node in 0..aig.node_count() {
            let Some([a, b]) = aig.try_unwrap_and(node) else {
                continue;
            };

            let existing = network.len();
            let mut best = network.and(translate(&map, a), translate(&map, b));
            let mut best_cost = (network.level(best), network.len() - existing);

            if critical.as_ref().map_or(true, |critical| critical[node]) {
                for cut in cuts[node].iter().filter(|cut| !cut.is_trivial_for(node)) {
                    let leaves =
                        cut.leaves().iter().map(|&leaf| translate(&map, Signal::from_node(leaf))).collect::<Vec<_>>();

                    let existing = network.len();
                    let Some(candidate) =
                        self.synthesizer.synthesize_balanced(&mut network, cut.truth(), &leaves, config.max_cubes)
                    else {
                        continue;
                    };
                    let cost = (network.level(candidate), network.len() - existing);
                    if cost < best_cost {
                        if cost.0 < best_cost.0 {
                            improved += 1;
                        }
                        best = candidate;
                        best_cost = cost;
                    }
                }
            }

            map[node] = best;
        }

        debug!(improved, "rebalanced gates");

        let mut network = network.into_inner();
        network.copy_outputs(aig, &map);
        network.sweep()
    }
}

/// Rebalance `mig` with [`SopRebalancing`].
///
/// # Errors
///
/// Returns [`crate::Error::StructuralViolation`] if a conversion finds a malformed network.
pub fn balance(mig: &Mig, params: &BalanceParams, cleanup: &RewriteParams) -> Result<Mig> {
    balance_with(mig, params, cleanup, &mut SopRebalancing::new())
}

/// Rebalance `mig` with a caller-supplied strategy.
///
/// The configuration handed to `strategy` is picked by gate count. The result replaces `mig` only if it is
/// shallower, or as deep with no more gates; otherwise a copy of `mig` is returned.
///
/// # Errors
///
/// Returns [`crate::Error::StructuralViolation`] if a conversion finds a malformed network.
pub fn balance_with(
    mig: &Mig,
    params: &BalanceParams,
    cleanup: &RewriteParams,
    strategy: &mut impl RebalancingStrategy,
) -> Result<Mig> {
    let before = (mig.gate_count(), DepthView::new(mig).depth());
    let config = params.select(before.0);
    debug!(gates = before.0, cut_size = config.cut_size, critical_only = config.only_on_critical_path, "balance");

    let aig = mig_to_aig(mig)?;
    let rebalanced = strategy.rebalance(&aig, config);
    let imported = aig_to_mig(&rebalanced)?;
    let candidate = match config.cleanup {
        Cleanup::Rewrite => rewrite(imported, cleanup),
        Cleanup::Sweep => imported.sweep(),
    };

    let after = (candidate.gate_count(), DepthView::new(&candidate).depth());
    let accept = after.1 < before.1 || (after.1 == before.1 && after.0 <= before.0);
    let result = if accept { candidate } else { mig.clone() };

    info!(
        gates_before = before.0,
        depth_before = before.1,
        gates_after = result.gate_count(),
        depth_after = DepthView::new(&result).depth(),
        "balance"
    );
    Ok(result)
}
