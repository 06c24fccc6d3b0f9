//! Time integration methods.

mod adams_bashforth;

pub use adams_bashforth::{AdamsBashforth2, IntegratorInfo, ab2_coefficients, ab2_update};
