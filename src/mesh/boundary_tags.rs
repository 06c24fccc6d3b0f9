//! Edge classification flags ("Kennung") for triangles.
//!
//! Edge `k` of a triangle joins local nodes `k` and `(k + 1) % 3`. Bit `k`
//! is set when that edge lies on the domain boundary.

/// Boundary-edge bitmask of a triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Kennung(u8);

impl Kennung {
    /// No boundary edges.
    pub const INTERIOR: Self = Self(0);

    /// Build from raw bits (only the lowest three are used).
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Mark edge `k` as a boundary edge.
    pub fn with_boundary_edge(self, k: usize) -> Self {
        debug_assert!(k < 3);
        Self(self.0 | (1 << k))
    }

    /// Whether edge `k` lies on the boundary.
    #[inline]
    pub fn is_boundary_edge(self, k: usize) -> bool {
        self.0 & (1 << k) != 0
    }

    /// Whether any edge lies on the boundary.
    #[inline]
    pub fn touches_boundary(self) -> bool {
        self.0 != 0
    }

    /// Local indices of boundary edges.
    pub fn boundary_edges(self) -> impl Iterator<Item = usize> {
        (0..3).filter(move |&k| self.is_boundary_edge(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kennung_bits() {
        let k = Kennung::INTERIOR.with_boundary_edge(0).with_boundary_edge(2);
        assert!(k.is_boundary_edge(0));
        assert!(!k.is_boundary_edge(1));
        assert!(k.is_boundary_edge(2));
        assert_eq!(k.boundary_edges().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(k.bits(), 0b101);
    }

    #[test]
    fn test_from_bits_masks_high_bits() {
        assert_eq!(Kennung::from_bits(0xff).bits(), 0b111);
        assert!(!Kennung::from_bits(0).touches_boundary());
    }
}
