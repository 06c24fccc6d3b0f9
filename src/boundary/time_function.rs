//! Scalar functions of time used for boundary values and forcing.
//!
//! Every bound boundary value is a [`TimeFunction`]: the boundary operator
//! writes `f(t)` into the unknown and `f'(t)` into its time derivative, so
//! that a Dirichlet component integrates consistently with the rest of the
//! node.
//!
//! Harmonic tides are expressed as
//! η(t) = η₀ + Σᵢ Aᵢ cos(ωᵢ t + φᵢ)
//! with analytic derivative.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Step used by the central-difference derivative fallback (s).
const DERIVATIVE_STEP: f64 = 1.0;

/// A scalar function of time.
pub trait TimeFunction: Send + Sync + fmt::Debug {
    /// Value at time `t` (s).
    fn value_at(&self, t: f64) -> f64;

    /// Time derivative at `t`.
    ///
    /// The default is a central difference with a one-second half-width.
    fn derivative_at(&self, t: f64) -> f64 {
        (self.value_at(t + DERIVATIVE_STEP) - self.value_at(t - DERIVATIVE_STEP))
            / (2.0 * DERIVATIVE_STEP)
    }
}

/// Shared, immutable time function.
pub type SharedFunction = Arc<dyn TimeFunction>;

// =============================================================================
// Constant
// =============================================================================

/// Time-independent value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant(pub f64);

impl TimeFunction for Constant {
    fn value_at(&self, _t: f64) -> f64 {
        self.0
    }

    fn derivative_at(&self, _t: f64) -> f64 {
        0.0
    }
}

// =============================================================================
// Harmonic
// =============================================================================

/// Tidal constituent data.
///
/// Represents a single harmonic component of the tide.
#[derive(Clone, Debug, PartialEq)]
pub struct TidalConstituent {
    /// Name of the constituent (e.g., "M2", "S2", "K1")
    pub name: String,
    /// Amplitude (meters)
    pub amplitude: f64,
    /// Period (seconds)
    pub period: f64,
    /// Phase (radians)
    pub phase: f64,
}

impl TidalConstituent {
    /// Create a new tidal constituent.
    pub fn new(name: impl Into<String>, amplitude: f64, period: f64, phase: f64) -> Self {
        Self {
            name: name.into(),
            amplitude,
            period,
            phase,
        }
    }

    /// Angular frequency ω = 2π/T.
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI / self.period
    }

    /// Principal lunar semidiurnal (M2) constituent.
    pub fn m2(amplitude: f64, phase: f64) -> Self {
        Self::new("M2", amplitude, 12.42 * 3600.0, phase)
    }

    /// Principal solar semidiurnal (S2) constituent.
    pub fn s2(amplitude: f64, phase: f64) -> Self {
        Self::new("S2", amplitude, 12.0 * 3600.0, phase)
    }

    /// Lunar diurnal (K1) constituent.
    pub fn k1(amplitude: f64, phase: f64) -> Self {
        Self::new("K1", amplitude, 23.93 * 3600.0, phase)
    }

    /// Lunar diurnal (O1) constituent.
    pub fn o1(amplitude: f64, phase: f64) -> Self {
        Self::new("O1", amplitude, 25.82 * 3600.0, phase)
    }
}

/// Mean level plus a sum of harmonic constituents.
#[derive(Clone, Debug, PartialEq)]
pub struct Harmonic {
    pub mean: f64,
    pub constituents: Vec<TidalConstituent>,
}

impl Harmonic {
    pub fn new(mean: f64, constituents: Vec<TidalConstituent>) -> Self {
        Self { mean, constituents }
    }

    /// Single M2 tide around `mean`.
    pub fn m2(mean: f64, amplitude: f64, phase: f64) -> Self {
        Self::new(mean, vec![TidalConstituent::m2(amplitude, phase)])
    }
}

impl TimeFunction for Harmonic {
    fn value_at(&self, t: f64) -> f64 {
        self.mean
            + self
                .constituents
                .iter()
                .map(|c| c.amplitude * (c.angular_frequency() * t + c.phase).cos())
                .sum::<f64>()
    }

    fn derivative_at(&self, t: f64) -> f64 {
        self.constituents
            .iter()
            .map(|c| {
                let omega = c.angular_frequency();
                -c.amplitude * omega * (omega * t + c.phase).sin()
            })
            .sum()
    }
}

// =============================================================================
// TimeSeries
// =============================================================================

/// Piecewise-linear series, held constant outside its range.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build from `(time, value)` pairs. Pairs are sorted by time.
    ///
    /// Returns `None` for an empty series.
    pub fn new(mut points: Vec<(f64, f64)>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (times, values) = points.into_iter().unzip();
        Some(Self { times, values })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the series has no samples (never true for a constructed series).
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index `i` with `times[i] <= t < times[i + 1]`, or `None` outside.
    fn segment(&self, t: f64) -> Option<usize> {
        let n = self.times.len();
        if n < 2 || t < self.times[0] || t >= self.times[n - 1] {
            return None;
        }
        let upper = self.times.partition_point(|&ti| ti <= t);
        Some(upper - 1)
    }
}

impl TimeFunction for TimeSeries {
    fn value_at(&self, t: f64) -> f64 {
        let n = self.times.len();
        match self.segment(t) {
            Some(i) => {
                let (t0, t1) = (self.times[i], self.times[i + 1]);
                let w = (t - t0) / (t1 - t0);
                (1.0 - w) * self.values[i] + w * self.values[i + 1]
            }
            None if t < self.times[0] => self.values[0],
            None => self.values[n - 1],
        }
    }

    fn derivative_at(&self, t: f64) -> f64 {
        match self.segment(t) {
            Some(i) => {
                (self.values[i + 1] - self.values[i]) / (self.times[i + 1] - self.times[i])
            }
            None => 0.0,
        }
    }
}

// =============================================================================
// Ramp
// =============================================================================

/// Linear spin-up from zero to the wrapped function over `duration` seconds.
#[derive(Clone, Debug)]
pub struct Ramp {
    pub inner: SharedFunction,
    pub start: f64,
    pub duration: f64,
}

impl Ramp {
    pub fn new(inner: SharedFunction, start: f64, duration: f64) -> Self {
        Self {
            inner,
            start,
            duration,
        }
    }

    fn factor(&self, t: f64) -> (f64, f64) {
        if self.duration <= 0.0 || t >= self.start + self.duration {
            (1.0, 0.0)
        } else if t <= self.start {
            (0.0, 0.0)
        } else {
            ((t - self.start) / self.duration, 1.0 / self.duration)
        }
    }
}

impl TimeFunction for Ramp {
    fn value_at(&self, t: f64) -> f64 {
        self.factor(t).0 * self.inner.value_at(t)
    }

    fn derivative_at(&self, t: f64) -> f64 {
        let (s, ds) = self.factor(t);
        ds * self.inner.value_at(t) + s * self.inner.derivative_at(t)
    }
}

// =============================================================================
// Closure
// =============================================================================

/// Function defined by a closure; the derivative uses the default.
pub struct FnFunction<F>(pub F);

impl<F> fmt::Debug for FnFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFunction")
    }
}

impl<F> TimeFunction for FnFunction<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn value_at(&self, t: f64) -> f64 {
        (self.0)(t)
    }
}

/// Wrap a value into a [`SharedFunction`].
pub fn shared(f: impl TimeFunction + 'static) -> SharedFunction {
    Arc::new(f)
}
