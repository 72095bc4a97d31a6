//! The tick type.
//!
//! Every delay, wait interval and clock reading in this crate is a `Uint`
//! number of ticks. Pick the width with a cargo feature:
//!
//! - `tick_u64` (default): `u64`
//! - `tick_u128`: `u128`, for clocks that count nanoseconds over long spans
//!
//! With neither feature, ticks are `u64`. Enabling both is a compile error.

#[cfg(all(feature = "tick_u64", feature = "tick_u128"))]
compile_error!("features `tick_u64` and `tick_u128` are mutually exclusive");

/// Unsigned tick count used for clocks, delays and waits.
#[cfg(not(feature = "tick_u128"))]
pub type Uint = u64;

/// Unsigned tick count used for clocks, delays and waits.
#[cfg(all(feature = "tick_u128", not(feature = "tick_u64")))]
pub type Uint = u128;
