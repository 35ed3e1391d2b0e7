//! Pixel coordinate to servo angle mapping.

use pantilt_models::Angle;

/// Map a coordinate along a frame dimension to a servo angle.
///
/// `[0, dim_len]` is interpolated linearly onto `[0, 180]`, rounded to the
/// nearest degree and clamped. A zero-length dimension or a non-finite
/// coordinate yields [`Angle::NEUTRAL`].
pub fn map_to_angle(coord: f64, dim_len: u32) -> Angle {
    if dim_len == 0 || !coord.is_finite() {
        return Angle::NEUTRAL;
    }
    let span = f64::from(Angle::MAX.degrees());
    let degrees = (coord / f64::from(dim_len) * span).round();
    Angle::saturating(degrees.clamp(0.0, span) as i64)
}
