//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Metres in one inch.
pub const METERS_PER_INCH: f64 = 0.0254;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a length in inches into metres.
pub fn inches_to_meters<T>(inches: T) -> T
where
    T: Float,
{
    inches * T::from(METERS_PER_INCH).unwrap_or_else(T::nan)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases, floating point round-off
/// may give `r == rhs.abs()` when `lhs` is a very small negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle in degrees into the range `(-180, 180]`.
pub fn wrap_deg_180<T>(angle_deg: T) -> T
where
    T: Float,
{
    let full = T::from(360.0).unwrap_or_else(T::nan);
    let half = T::from(180.0).unwrap_or_else(T::nan);

    let wrapped = rem_euclid(angle_deg, full);

    if wrapped > half {
        wrapped - full
    } else {
        wrapped
    }
}
