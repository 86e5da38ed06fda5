//! Conversion between and-inverter and majority-inverter graphs.
//!
//! Both directions walk the source from its outputs with an explicit stack, so arbitrarily deep chains convert
//! without recursion, and map every source node exactly once.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::sim::{apply, var_mask};
use crate::synth::Synthesizer;
use crate::traits::{Builder, Network};
use crate::{Aig, Mig, Signal};

fn lookup(map: &[Option<Signal>], signal: Signal) -> Result<Signal> {
    map[signal.node()]
        .map(|mapped| mapped.complement_if(signal.is_complemented()))
        .ok_or_else(|| Error::structural(format!("node {} used before it was mapped", signal.node())))
}

/// Copy `source` into a fresh `T`, building each gate with `build` once all of its fanins are mapped.
///
/// `build` receives the target, the source gate's index and its fanins already translated into the target.
fn convert<S, T, F>(source: &S, arity: usize, mut build: F) -> Result<T>
where
    S: Network,
    T: Builder,
    F: FnMut(&mut T, usize, &[Signal]) -> Signal,
{
    if source.gate_count() == 0 {
        warn!(inputs = source.inputs().len(), outputs = source.outputs().len(), "network has no gates");
    }

    let mut target = T::empty();
    let mut map: Vec<Option<Signal>> = vec![None; source.node_count()];
    map[0] = Some(Signal::FALSE);
    for (port, &node) in source.inputs().iter().enumerate() {
        map[node] = Some(target.add_input(source.input_name(port).map(String::from)));
    }

    let mut stack = Vec::new();
    let mut translated = Vec::with_capacity(arity);

    for (port, &output) in source.outputs().iter().enumerate() {
        stack.push((output.node(), false));

        while let Some((node, expanded)) = stack.pop() {
            if map[node].is_some() {
                continue;
            }

            let fanins = source.fanins(node);
            if fanins.is_empty() {
                return Err(Error::structural(format!("node {node} is neither an input nor a gate")));
            }
            if fanins.len() != arity {
                return Err(Error::structural(format!(
                    "gate {node} has {} fanins, expected {arity}",
                    fanins.len()
                )));
            }
            if let Some(fanin) = fanins.iter().find(|fanin| fanin.node() >= node) {
                return Err(Error::structural(format!(
                    "gate {node} uses node {} which is not created before it",
                    fanin.node()
                )));
            }

            if expanded {
                translated.clear();
                for &fanin in fanins {
                    translated.push(lookup(&map, fanin)?);
                }
                map[node] = Some(build(&mut target, node, &translated));
            } else {
                stack.push((node, true));
                stack.extend(
                    fanins.iter().filter(|fanin| map[fanin.node()].is_none()).map(|fanin| (fanin.node(), false)),
                );
            }
        }

        target.add_output(lookup(&map, output)?, source.output_name(port).map(String::from));
    }

    Ok(target)
}

/// Import an and-inverter graph as a majority-inverter graph, turning each `a & b` into `M(a, b, 0)`.
///
/// # Errors
///
/// Returns [`Error::StructuralViolation`] if a gate of `source` does not have exactly two fanins or refers to a node
/// created after it.
pub fn aig_to_mig<N: Network>(source: &N) -> Result<Mig> {
    let mig: Mig = convert(source, 2, |mig: &mut Mig, _, fanins| mig.majority(fanins[0], fanins[1], Signal::FALSE))?;
    debug!(gates = mig.gate_count(), "imported network");
    Ok(mig)
}

/// Export a majority-inverter graph as an and-inverter graph, resynthesizing each majority from its truth table.
///
/// # Errors
///
/// Returns [`Error::StructuralViolation`] if a gate of `source` does not have exactly three fanins or refers to a
/// node created after it.
pub fn mig_to_aig<N: Network>(source: &N) -> Result<Aig> {
    let mut synthesizer = Synthesizer::new();

    let aig: Aig = convert(source, 3, |aig: &mut Aig, node, fanins| {
        let original = source.fanins(node);

        // The gate's function over its distinct non-constant fanin nodes.
        let mut leaves = original.iter().map(|fanin| fanin.node()).filter(|&node| node != 0).collect::<Vec<_>>();
        leaves.sort_unstable();
        leaves.dedup();

        let values = original
            .iter()
            .map(|fanin| {
                let value = leaves.binary_search(&fanin.node()).map_or(0, var_mask);
                apply(value, *fanin)
            })
            .collect::<Vec<_>>();
        let table = N::evaluate(&values);

        let leaf_signals = leaves
            .iter()
            .map(|leaf| {
                let position = original.iter().position(|fanin| fanin.node() == *leaf).unwrap_or(0);
                fanins[position].complement_if(original[position].is_complemented())
            })
            .collect::<Vec<_>>();

        synthesizer.synthesize(aig, table, &leaf_signals)
    })?;

    debug!(gates = aig.gate_count(), "exported network");
    Ok(aig)
}

#[cfg(test)]
mod tests {
    use super::{aig_to_mig, mig_to_aig};
    use crate::error::Error;
    use crate::sim::equivalent;
    use crate::traits::{Builder, Network};
    use crate::{Aig, Mig, Signal};

    #[test]
    fn and_becomes_majority_with_zero() {
        let mut aig = Aig::new();
        let a = aig.add_input(Some("a".to_string()));
        let b = aig.add_input(None);
        let ab = aig.and(a, !b);
        aig.add_output(!ab, Some("nand".to_string()));

        let mig = aig_to_mig(&aig).expect("well-formed network");
        assert_eq!(mig.gate_count(), 1);
        assert_eq!(mig.input_name(0), Some("a"));
        assert_eq!(mig.output_name(0), Some("nand"));
        assert_eq!(equivalent(&aig, &mig), Some(true));
    }

    #[test]
    fn majority_exports_to_four_ands() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let m = mig.majority(a, b, c);
        mig.push_output(m);

        let aig = mig_to_aig(&mig).expect("well-formed network");
        assert_eq!(aig.gate_count(), 4);
        assert_eq!(equivalent(&aig, &mig), Some(true));
    }

    #[test]
    fn and_and_or_export_to_one_gate() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let and = mig.majority(a, !b, Signal::FALSE);
        let or = mig.majority(a, b, Signal::TRUE);
        mig.push_output(and);
        mig.push_output(!or);

        let aig = mig_to_aig(&mig).expect("well-formed network");
        assert_eq!(aig.gate_count(), 2);
        assert_eq!(equivalent(&aig, &mig), Some(true));
    }

    #[test]
    fn empty_network_converts() {
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        aig.add_output(a, None);
        aig.add_output(Signal::TRUE, None);

        let mig = aig_to_mig(&aig).expect("a buffer is legal");
        assert_eq!(mig.gate_count(), 0);
        assert_eq!(mig.outputs(), &[a, Signal::TRUE]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let mut chain = a;
        for i in 0..100_000 {
            chain = aig.and(chain, b.complement_if(i % 2 == 0));
            chain = !chain;
        }
        aig.add_output(chain, None);

        let mig = aig_to_mig(&aig).expect("well-formed network");
        assert_eq!(mig.gate_count(), aig.gate_count());
        let back = mig_to_aig(&mig).expect("well-formed network");
        assert_eq!(equivalent(&aig, &back), Some(true));
    }

    #[test]
    fn wrong_arity_is_a_structural_violation() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let m = mig.majority(a, b, c);
        mig.push_output(m);

        // A majority graph is not a valid and-inverter graph source.
        assert!(matches!(aig_to_mig(&mig), Err(Error::StructuralViolation(_))));

        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let ab = aig.and(a, b);
        aig.add_output(ab, None);
        assert!(matches!(mig_to_aig(&aig), Err(Error::StructuralViolation(_))));
    }
}
