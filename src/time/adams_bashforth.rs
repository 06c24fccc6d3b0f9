//! Variable-step second-order Adams–Bashforth integrator.
//!
//! ```text
//! q(t + dt) = q(t) + dt · (β0 · R(t) + β1 · R(t − dt_prev))
//! ω  = dt / dt_prev / 2
//! β0 = 1 + ω,  β1 = −ω
//! ```
//!
//! The very first step (no history, `dt_prev == 0`) is forward Euler:
//! `β0 = 1, β1 = 0`.

// =============================================================================
// IntegratorInfo Trait
// =============================================================================

/// Non-generic information about a time integrator.
pub trait IntegratorInfo: Send + Sync {
    /// Human-readable name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Order of accuracy of the integrator.
    fn order(&self) -> usize;

    /// Number of right-hand-side evaluations per step.
    fn n_stages(&self) -> usize;
}

// =============================================================================
// Adams–Bashforth 2
// =============================================================================

/// Variable-step AB2 with step-size history.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdamsBashforth2 {
    dt_prev: f64,
}

impl AdamsBashforth2 {
    /// Fresh integrator without history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step size of the previous call, zero before the first step.
    #[inline]
    pub fn dt_prev(&self) -> f64 {
        self.dt_prev
    }

    /// Whether the next step will be an Euler start-up step.
    #[inline]
    pub fn is_first_step(&self) -> bool {
        self.dt_prev == 0.0
    }

    /// Weights `(β0, β1)` for the current and previous derivative.
    #[inline]
    pub fn coefficients(&self, dt: f64) -> (f64, f64) {
        ab2_coefficients(dt, self.dt_prev)
    }

    /// Record `dt` as the previous step size.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        self.dt_prev = dt;
    }

    /// Forget the history; the next step is Euler again.
    pub fn reset(&mut self) {
        self.dt_prev = 0.0;
    }
}

impl IntegratorInfo for AdamsBashforth2 {
    fn name(&self) -> &'static str {
        "adams-bashforth-2"
    }

    fn order(&self) -> usize {
        2
    }

    fn n_stages(&self) -> usize {
        1
    }
}

/// AB2 weights for a step `dt` following a step `dt_prev`.
#[inline]
pub fn ab2_coefficients(dt: f64, dt_prev: f64) -> (f64, f64) {
    if dt_prev == 0.0 {
        return (1.0, 0.0);
    }
    let omega = dt / dt_prev / 2.0;
    (1.0 + omega, -omega)
}

/// Scalar AB2 update.
#[inline(always)]
pub fn ab2_update(q: f64, dt: f64, beta: (f64, f64), r_new: f64, r_prev: f64) -> f64 {
    q + dt * (beta.0 * r_new + beta.1 * r_prev)
}
