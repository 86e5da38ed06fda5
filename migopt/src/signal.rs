use std::fmt;
use std::ops::Not;

/// An edge into the graph: a node index plus an inversion flag.
///
/// The least significant bit signifies inversion state, the remaining bits are the node index. This is the same
/// layout AIGER uses for its literals, so node `0` is the constant and `Signal::TRUE` is its inversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal(usize);

impl Signal {
    /// The constant zero.
    pub const FALSE: Self = Self(0);
    /// The constant one.
    pub const TRUE: Self = Self(1);

    /// Create a signal pointing at `node`, optionally inverted.
    #[must_use]
    pub const fn new(node: usize, complemented: bool) -> Self {
        Self((node << 1) | complemented as usize)
    }

    /// Create a non-inverted signal pointing at `node`.
    #[must_use]
    pub const fn from_node(node: usize) -> Self {
        Self::new(node, false)
    }

    /// The node this signal points at.
    #[must_use]
    pub const fn node(self) -> usize {
        self.0 >> 1
    }

    /// Whether this edge carries an inverter.
    #[must_use]
    pub const fn is_complemented(self) -> bool {
        self.0 & 1 == 1
    }

    /// Toggle the inverter if `complement` is set.
    #[must_use]
    pub const fn complement_if(self, complement: bool) -> Self {
        Self(self.0 ^ complement as usize)
    }

    /// This signal with the inverter stripped.
    #[must_use]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Whether this signal is one of the two constants.
    #[must_use]
    pub const fn is_constant(self) -> bool {
        self.node() == 0
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(self) -> Self {
        Self(self.0 ^ 1)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complemented() {
            write!(f, "{}'", self.node())
        } else {
            write!(f, "{}", self.node())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Signal;

    #[test]
    fn constants_share_a_node() {
        assert_eq!(Signal::FALSE.node(), 0);
        assert_eq!(Signal::TRUE.node(), 0);
        assert_eq!(!Signal::FALSE, Signal::TRUE);
        assert!(Signal::TRUE.is_constant());
    }

    #[test]
    fn polarity_is_part_of_identity() {
        let x = Signal::from_node(7);
        assert_ne!(x, !x);
        assert_eq!(x, !!x);
        assert_eq!((!x).regular(), x);
        assert_eq!(x.complement_if(true), !x);
        assert_eq!(x.complement_if(false), x);
        assert_eq!((!x).to_string(), "7'");
    }
}
