use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every quantity, rate, and elapsed time in the tick path uses this type so
/// that additions from different threads commute exactly.
pub type Fixed64 = I32F32;

/// Elapsed simulation time in seconds.
pub type Seconds = Fixed64;

/// Ticks are the atomic unit of scheduler time.
pub type Ticks = u64;

/// Amounts at or below this are negligible (about 1e-6).
pub const QUANTITY_EPSILON: Fixed64 = Fixed64::from_bits(1 << 12);

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in the tick loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked multiplication for Fixed64 that returns None on overflow.
#[inline]
pub fn checked_mul_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_mul(b)
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Clamp negative inputs to zero.
#[inline]
pub(crate) fn non_negative(v: Fixed64) -> Fixed64 {
    if v < Fixed64::ZERO { Fixed64::ZERO } else { v }
}

/// True when `a` and `b` differ by no more than [`QUANTITY_EPSILON`].
#[inline]
pub fn approx_eq(a: Fixed64, b: Fixed64) -> bool {
    (a - b).abs() <= QUANTITY_EPSILON
}
