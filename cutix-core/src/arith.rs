//! Integer arithmetic helpers shared by the cut generators.
//!
//! All divisions here are mathematical (round toward minus or plus
//! infinity), not the truncating division of `/`. Callers that cannot
//! guarantee a positive divisor or an in-range product must use the
//! checked variants.

/// Largest multiple of `b` at most `a`, divided by `b`. Requires `b > 0`.
pub fn floor_ratio(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    a.div_euclid(b)
}

/// Smallest multiple of `b` at least `a`, divided by `b`. Requires `b > 0`.
pub fn ceil_ratio(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    let q = a.div_euclid(b);
    if a.rem_euclid(b) != 0 {
        q + 1
    } else {
        q
    }
}

/// Remainder of `a / b` normalized to `[0, b)`. Requires `b > 0`.
pub fn positive_remainder(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    a.rem_euclid(b)
}

/// `positive_remainder` for a 128-bit accumulator; the result fits in i64
/// because it is smaller than `b`.
pub fn positive_remainder_i128(a: i128, b: i64) -> i64 {
    debug_assert!(b > 0);
    a.rem_euclid(b as i128) as i64
}

/// Greatest common divisor; `gcd(0, x) == x`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple, `None` on 64-bit overflow.
pub fn checked_lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Floor division of a 128-bit value by a positive 64-bit divisor.
pub fn floor_ratio_i128(a: i128, b: i64) -> i128 {
    debug_assert!(b > 0);
    a.div_euclid(b as i128)
}

/// Ceil division of a 128-bit value by a positive 64-bit divisor.
pub fn ceil_ratio_i128(a: i128, b: i64) -> i128 {
    debug_assert!(b > 0);
    let b = b as i128;
    let q = a.div_euclid(b);
    if a.rem_euclid(b) != 0 {
        q + 1
    } else {
        q
    }
}
