//! The optimizer facade: one majority graph, its configuration, and everything that can be done to it.

use std::path::Path;

use tracing::info;

use crate::balance::{balance_with, RebalancingStrategy, SopRebalancing};
use crate::config::OptimizerConfig;
use crate::convert::{aig_to_mig, mig_to_aig};
use crate::error::Result;
use crate::io::{read_aiger, write_aiger};
use crate::refactor::refactor;
use crate::resub::resub;
use crate::rewrite::rewrite;
use crate::traits::Network;
use crate::view::DepthView;
use crate::Mig;

/// An optimization session over a single majority-inverter graph.
///
/// Every pass replaces the network in one step, so a session never holds a partially rewritten graph.
#[derive(Clone, Debug)]
pub struct Session {
    mig: Mig,
    config: OptimizerConfig,
}

fn import(path: &Path) -> Result<Mig> {
    let aig = read_aiger(path)?;
    let mig = aig_to_mig(&aig)?;
    info!(path = %path.display(), gates = mig.gate_count(), depth = DepthView::new(&mig).depth(), "loaded network");
    Ok(mig)
}

impl Session {
    /// Load an AIGER file with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a load error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, OptimizerConfig::default())
    }

    /// Load an AIGER file with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a load error if the file cannot be read or parsed.
    pub fn load_with_config(path: impl AsRef<Path>, config: OptimizerConfig) -> Result<Self> {
        let mig = import(path.as_ref())?;
        Ok(Self { mig, config })
    }

    /// Start a session on a network built in memory.
    #[must_use]
    pub const fn from_mig(mig: Mig, config: OptimizerConfig) -> Self {
        Self { mig, config }
    }

    /// Replace the network with the contents of another file.
    ///
    /// The file is parsed completely before anything is replaced, so on error the session keeps its network.
    ///
    /// # Errors
    ///
    /// Returns a load error if the file cannot be read or parsed.
    pub fn reset(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.mig = import(path.as_ref())?;
        Ok(())
    }

    /// Run algebraic rewriting.
    pub fn rewrite(&mut self) {
        let mig = std::mem::take(&mut self.mig);
        self.mig = rewrite(mig, &self.config.rewrite);
    }

    /// Run cone refactoring.
    pub fn refactor(&mut self) {
        let mig = std::mem::take(&mut self.mig);
        self.mig = refactor(mig, &self.config.refactor);
    }

    /// Run cut-based rebalancing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StructuralViolation`] if a conversion finds a malformed network; the session keeps
    /// its network.
    pub fn balance(&mut self) -> Result<()> {
        self.balance_with(&mut SopRebalancing::new())
    }

    /// Run rebalancing with a caller-supplied strategy.
    ///
    /// # Errors
    ///
    /// As [`Self::balance`].
    pub fn balance_with(&mut self, strategy: &mut impl RebalancingStrategy) -> Result<()> {
        self.mig = balance_with(&self.mig, &self.config.balance, &self.config.rewrite, strategy)?;
        Ok(())
    }

    /// Run resubstitution.
    pub fn resub(&mut self) {
        let mig = std::mem::take(&mut self.mig);
        self.mig = resub(mig, &self.config.resub);
    }

    /// The number of majority gates.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.mig.gate_count()
    }

    /// The longest path from an input to an output.
    #[must_use]
    pub fn depth(&self) -> usize {
        DepthView::new(&self.mig).depth()
    }

    /// Weighted switching activity of the network.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn switching_activity(&self) -> f32 {
        crate::power::switching_activity(&self.mig) as f32
    }

    /// Write the network as an and-inverter graph: ASCII AIGER if the path ends in `.aag`, binary otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let aig = mig_to_aig(&self.mig)?;
        write_aiger(&aig, path)
    }

    /// The current network.
    #[must_use]
    pub const fn network(&self) -> &Mig {
        &self.mig
    }

    /// The configuration passes run with.
    #[must_use]
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Change the configuration for subsequent passes.
    pub fn set_config(&mut self, config: OptimizerConfig) {
        self.config = config;
    }
}
