//! Random networks through every conversion and pass, checked by exhaustive simulation.

use migopt::config::{BalanceParams, RefactorParams, ResubParams, RewriteParams};
use migopt::convert::{aig_to_mig, mig_to_aig};
use migopt::io::{parse_aiger, write_ascii, write_binary};
use migopt::sim::equivalent;
use migopt::traits::{Builder, Network};
use migopt::view::DepthView;
use migopt::{Aig, Mig};
use quickcheck::{quickcheck, Arbitrary, Gen};

/// A random and-inverter graph over up to ten inputs.
#[derive(Clone, Debug)]
struct RandomAig(Aig);

impl Arbitrary for RandomAig {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut aig = Aig::new();
        let inputs = 1 + usize::arbitrary(g) % 10;
        let mut signals = (0..inputs).map(|_| aig.add_input(None)).collect::<Vec<_>>();

        for _ in 0..usize::arbitrary(g) % 80 {
            let a = *g.choose(&signals).unwrap_or(&signals[0]);
            let b = *g.choose(&signals).unwrap_or(&signals[0]);
            let gate = aig.and(a.complement_if(bool::arbitrary(g)), b.complement_if(bool::arbitrary(g)));
            signals.push(gate);
        }

        for _ in 0..1 + usize::arbitrary(g) % 4 {
            let output = *g.choose(&signals).unwrap_or(&signals[0]);
            aig.add_output(output.complement_if(bool::arbitrary(g)), None);
        }

        Self(aig)
    }
}

fn import(aig: &Aig) -> Mig {
    aig_to_mig(aig).expect("random networks are well-formed")
}

quickcheck! {
    fn import_preserves_function(aig: RandomAig) -> bool {
        equivalent(&aig.0, &import(&aig.0)) == Some(true)
    }

    fn export_preserves_function(aig: RandomAig) -> bool {
        let mig = import(&aig.0);
        mig_to_aig(&mig).is_ok_and(|exported| equivalent(&mig, &exported) == Some(true))
    }

    fn files_preserve_function(aig: RandomAig) -> bool {
        let mut binary = Vec::new();
        let mut ascii = Vec::new();
        write_binary(&aig.0, &mut binary).expect("writing to memory");
        write_ascii(&aig.0, &mut ascii).expect("writing to memory");

        [binary, ascii].iter().all(|bytes| {
            parse_aiger(bytes).is_ok_and(|back| equivalent(&aig.0, &back) == Some(true))
        })
    }

    fn rewrite_preserves_function(aig: RandomAig, allow_area_increase: bool) -> bool {
        let mig = import(&aig.0);
        let params = RewriteParams { allow_area_increase, ..RewriteParams::default() };
        let rewritten = migopt::rewrite::rewrite(mig.clone(), &params);
        let grows = rewritten.gate_count() > mig.gate_count()
            || DepthView::new(&rewritten).depth() > DepthView::new(&mig).depth();
        equivalent(&mig, &rewritten) == Some(true) && (allow_area_increase || !grows)
    }

    fn refactor_preserves_function(aig: RandomAig, allow_zero_gain: bool) -> bool {
        let mig = import(&aig.0);
        let params = RefactorParams { allow_zero_gain, ..RefactorParams::default() };
        let refactored = migopt::refactor::refactor(mig.clone(), &params);
        refactored.gate_count() <= mig.gate_count() && equivalent(&mig, &refactored) == Some(true)
    }

    fn resub_preserves_function(aig: RandomAig, preserve_depth: bool) -> bool {
        let mig = import(&aig.0);
        let params = ResubParams { preserve_depth, ..ResubParams::default() };
        let resubstituted = migopt::resub::resub(mig.clone(), &params);
        resubstituted.gate_count() <= mig.gate_count() && equivalent(&mig, &resubstituted) == Some(true)
    }

    fn switching_activity_is_never_negative(aig: RandomAig) -> bool {
        let mig = import(&aig.0);
        migopt::power::switching_activity(&mig) >= 0.0 && migopt::power::switching_activity(&aig.0) >= 0.0
    }

    fn balance_preserves_function(aig: RandomAig, critical_only: bool) -> bool {
        let mig = import(&aig.0);
        let params = if critical_only {
            BalanceParams { size_threshold: 0, ..BalanceParams::default() }
        } else {
            BalanceParams::default()
        };
        migopt::balance::balance(&mig, &params, &RewriteParams::default()).is_ok_and(|balanced| {
            DepthView::new(&balanced).depth() <= DepthView::new(&mig).depth()
                && equivalent(&mig, &balanced) == Some(true)
        })
    }
}
