use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Scale an item count by a factor, truncating toward zero.
///
/// Negative factors yield zero; products past `u32::MAX` saturate.
pub fn scale_quantity(quantity: u32, factor: Fixed64) -> u32 {
    if factor <= Fixed64::ZERO {
        return 0;
    }
    // Exact product in Q32.32 bits, widened so large stacks cannot overflow.
    let whole = (quantity as i128 * factor.to_bits() as i128) >> Fixed64::FRAC_NBITS;
    whole.min(u32::MAX as i128) as u32
}
