//! Integer square root for converting credit spend into votes.
//!
//! votes = floor(sqrt(credits))

/// Integer square root using Newton's method.
/// Returns floor(sqrt(x)) for every `u64`, with no floating point.
pub fn isqrt(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }

    // (x + 1) / 2 without overflowing at u64::MAX
    let mut z = x / 2 + (x & 1);
    let mut y = x;

    while z < y {
        y = z;
        z = (x / z + z) / 2;
    }

    y
}
