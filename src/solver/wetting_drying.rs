//! Wetting/drying treatment on linear triangles.
//!
//! A node is *dry* when its water depth is below the wetting threshold
//! `WATT`, and its wet fraction is `λ = clamp(d / WATT, 0, 1)`. An element
//! is classified by the number of dry nodes (`iwatt`); when all three are
//! below `WATT / 2` the element is *totally dry* and only a leak term is
//! assembled.
//!
//! Partially wet elements do not use the naive free-surface gradient. Dry
//! nodes lying above the wet part of the element would otherwise drive
//! water uphill onto the flat, so their levels are blended toward the wet
//! level before the gradient is formed:
//!
//! - `iwatt == 1`: a dry node above the mean wet level is blended toward it.
//! - `iwatt == 2`: dry nodes are visited in local order and blended toward
//!   the wet node, until the first one lying below it stops the loop.
//! - `iwatt == 3`: nodes above the deepest node are blended toward it and
//!   the gradient is scaled by the deepest node's wet fraction.

use crate::mesh::Triangle;

/// Wetting threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Watt {
    /// Depth below which a node counts as dry (m)
    pub threshold: f64,
}

impl Watt {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Wet fraction `clamp(d / WATT, 0, 1)`.
    #[inline(always)]
    pub fn wlambda(&self, depth: f64) -> f64 {
        (depth / self.threshold).clamp(0.0, 1.0)
    }

    /// `(λ, 1 − λ)`.
    #[inline(always)]
    pub fn fractions(&self, depth: f64) -> (f64, f64) {
        let l = self.wlambda(depth);
        (l, 1.0 - l)
    }

    #[inline(always)]
    pub fn is_dry(&self, depth: f64) -> bool {
        depth < self.threshold
    }

    #[inline(always)]
    pub fn is_totally_dry(&self, depth: f64) -> bool {
        depth < 0.5 * self.threshold
    }

    /// Classify an element from its nodal depths.
    pub fn classify(&self, depths: [f64; 3]) -> Wetness {
        let dry = depths.map(|d| self.is_dry(d));
        Wetness {
            iwatt: dry.iter().filter(|&&d| d).count(),
            totally_dry: depths.iter().all(|&d| self.is_totally_dry(d)),
            dry,
        }
    }
}

/// Wetness classification of one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wetness {
    /// Number of nodes below the threshold
    pub iwatt: usize,
    /// All nodes below half the threshold
    pub totally_dry: bool,
    /// Per-node dry flag
    pub dry: [bool; 3],
}

impl Wetness {
    /// Classification used by models without wetting and drying.
    pub const WET: Self = Self {
        iwatt: 0,
        totally_dry: false,
        dry: [false; 3],
    };
}

/// Levels after wetting/drying blending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimitedLevels {
    pub levels: [f64; 3],
    /// Factor applied to the resulting gradient
    pub scale: f64,
}

#[inline(always)]
fn blend(lambda: f64, level: f64, toward: f64) -> f64 {
    lambda * level + (1.0 - lambda) * toward
}

/// Blend free-surface levels of a partially wet element.
pub fn limit_levels(levels: [f64; 3], depths: [f64; 3], watt: &Watt) -> LimitedLevels {
    let w = watt.classify(depths);
    let lambda = depths.map(|d| watt.wlambda(d));
    let mut out = levels;
    let mut scale = 1.0;

    match w.iwatt {
        1 => {
            let (wet_sum, n_wet) = (0..3)
                .filter(|&j| !w.dry[j])
                .fold((0.0, 0), |(s, n), j| (s + levels[j], n + 1));
            let mean_wet = wet_sum / n_wet as f64;
            if let Some(k) = (0..3).find(|&j| w.dry[j]) {
                if levels[k] > mean_wet {
                    out[k] = blend(lambda[k], levels[k], mean_wet);
                }
            }
        }
        2 => {
            if let Some(wet) = (0..3).find(|&j| !w.dry[j]) {
                let lw = levels[wet];
                for k in (0..3).filter(|&j| w.dry[j]) {
                    if levels[k] < lw {
                        break;
                    }
                    out[k] = blend(lambda[k], levels[k], lw);
                }
            }
        }
        3 => {
            let mut m = 0;
            for j in 1..3 {
                if depths[j] > depths[m] {
                    m = j;
                }
            }
            let lm = levels[m];
            for k in 0..3 {
                if k != m && levels[k] > lm {
                    out[k] = blend(lambda[k], levels[k], lm);
                }
            }
            scale = lambda[m];
        }
        _ => {}
    }

    LimitedLevels { levels: out, scale }
}

/// Free-surface gradient with wetting/drying limiting.
pub fn limited_gradient(
    tri: &Triangle,
    levels: [f64; 3],
    depths: [f64; 3],
    watt: &Watt,
) -> (f64, f64) {
    let limited = limit_levels(levels, depths, watt);
    let (dx, dy) = tri.gradient(limited.levels);
    (limited.scale * dx, limited.scale * dy)
}

/// Node-pair blending factor `gl_ij` for the Galerkin sum.
///
/// Unity on the diagonal and between fully wet nodes. Otherwise the wet
/// fraction of `j` when `j` is at least as high as `i`, and the smaller of
/// both wet fractions when `j` lies below `i`.
#[inline]
pub fn gl_factor(i: usize, j: usize, levels: &[f64; 3], lambda: &[f64; 3]) -> f64 {
    if i == j || (lambda[i] >= 1.0 && lambda[j] >= 1.0) {
        1.0
    } else if levels[j] >= levels[i] {
        lambda[j]
    } else {
        lambda[i].min(lambda[j])
    }
}

/// All nine `gl_ij` of an element.
pub fn gl_matrix(levels: &[f64; 3], lambda: &[f64; 3]) -> [[f64; 3]; 3] {
    let mut gl = [[1.0; 3]; 3];
    for (i, row) in gl.iter_mut().enumerate() {
        for (j, g) in row.iter_mut().enumerate() {
            *g = gl_factor(i, j, levels, lambda);
        }
    }
    gl
}
