//! Probabilistic switching-activity estimation.

use crate::traits::Network;
use crate::view::FanoutView;

/// The probability of every node being one, assuming independent inputs that are one half of the time.
#[must_use]
pub fn signal_probabilities<N: Network>(network: &N) -> Vec<f64> {
    let mut probabilities = vec![0.0; network.node_count()];
    for &input in network.inputs() {
        probabilities[input] = 0.5;
    }

    let mut fanins = Vec::with_capacity(N::ARITY);
    for node in 0..network.node_count() {
        if !network.is_gate(node) {
            continue;
        }
        fanins.clear();
        fanins.extend(network.fanins(node).iter().map(|fanin| {
            let p = probabilities[fanin.node()];
            if fanin.is_complemented() {
                1.0 - p
            } else {
                p
            }
        }));
        probabilities[node] = N::probability(&fanins);
    }

    probabilities
}

/// The chance that a node with the given one-probability toggles between two random input vectors.
fn toggle_rate(probability: f64) -> f64 {
    2.0 * probability * (1.0 - probability)
}

/// Weighted switching activity: the sum over gates of `2p(1 - p)`, each weighted by one plus the gate's fanout.
#[must_use]
pub fn switching_activity<N: Network>(network: &N) -> f64 {
    let probabilities = signal_probabilities(network);
    let fanout = FanoutView::new(network);

    (0..network.node_count())
        .filter(|&node| network.is_gate(node))
        .map(|node| {
            let alpha = toggle_rate(probabilities[node]);
            #[allow(clippy::cast_precision_loss)]
            let weight = (1 + fanout.fanout_count(node)) as f64;
            alpha * weight
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{signal_probabilities, switching_activity, toggle_rate};
    use crate::traits::{Builder, Network};
    use crate::{Aig, Mig, Signal};

    #[test]
    fn single_majority() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let c = mig.push_input();
        let m = mig.majority(a, b, c);
        mig.push_output(m);

        let p = signal_probabilities(&mig);
        assert!((p[m.node()] - 0.5).abs() < 1e-12);
        // alpha = 0.5, weighted by one output.
        assert!((switching_activity(&mig) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn buffer_has_no_activity() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        mig.push_output(a);
        assert!(switching_activity(&mig).abs() < f64::EPSILON);
    }

    #[test]
    fn and_gate_is_skewed() {
        let mut mig = Mig::new();
        let a = mig.push_input();
        let b = mig.push_input();
        let ab = mig.majority(a, b, Signal::FALSE);
        let nab = mig.majority(!a, b, Signal::TRUE);
        mig.push_output(ab);
        mig.push_output(nab);
        mig.push_output(nab);

        let p = signal_probabilities(&mig);
        assert!((p[ab.node()] - 0.25).abs() < 1e-12);
        // a' + b is one three quarters of the time.
        assert!((p[nab.node()] - 0.75).abs() < 1e-12);
        // 2 * 0.25 * 0.75 = 0.375, weighted by 2 and 3.
        assert!((switching_activity(&mig) - 0.375 * 5.0).abs() < 1e-12);
    }

    #[test]
    fn aig_probabilities_multiply() {
        let mut aig = Aig::new();
        let a = aig.add_input(None);
        let b = aig.add_input(None);
        let c = aig.add_input(None);
        let ab = aig.and(a, b);
        let abc = aig.and(ab, !c);
        aig.add_output(abc, None);

        let p = signal_probabilities(&aig);
        assert!((p[abc.node()] - 0.125).abs() < 1e-12);
        assert!(switching_activity(&aig) > 0.0);
    }

    #[test]
    fn constant_fanins_contribute_nothing() {
        // Gate construction folds these away, so check the per-gate arithmetic directly.
        for fanins in [[0.0, 1.0, 1.0], [0.0, 0.0, 0.5], [1.0, 1.0, 0.5]] {
            let p = Mig::probability(&fanins);
            assert!(p == 0.0 || p == 1.0, "{fanins:?} gives {p}");
            assert_eq!(toggle_rate(p), 0.0);
        }
        assert_eq!(toggle_rate(Aig::probability(&[0.0, 0.5])), 0.0);
        assert_eq!(toggle_rate(Aig::probability(&[1.0, 1.0])), 0.0);
    }

    #[test]
    fn toggle_rate_peaks_at_one_half() {
        assert!((toggle_rate(0.5) - 0.5).abs() < 1e-12);
        assert!(toggle_rate(0.25) < toggle_rate(0.5));
        assert!(toggle_rate(0.25) > 0.0);
    }
}
