//! Approximate surface distance between two coordinates.

/// Earth radius used by the search servers' geo helpers, in meters.
pub const EARTH_RADIUS_M: f64 = 6_367_000.0;

/// Distance in meters between `(lon1, lat1)` and `(lon2, lat2)`, in degrees.
///
/// Uses an equirectangular projection centred on the mean latitude of the
/// two points rather than a great-circle formula. Good for short distances,
/// increasingly off for long ones; existing callers depend on these exact
/// numbers, so the formula must stay as is.
///
/// ```rust
/// use xunsearch_core::util::geo::geo_distance;
///
/// assert_eq!(geo_distance(116.4, 39.9, 116.4, 39.9), 0.0);
/// let d = geo_distance(116.40, 39.90, 116.41, 39.90);
/// assert!((d - 852.0).abs() < 1.0);
/// ```
pub fn geo_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let dx = lon1 - lon2;
    let dy = lat1 - lat2;
    let b = (lat1 + lat2) / 2.0;
    let lx = EARTH_RADIUS_M * dx.to_radians() * b.to_radians().cos();
    let ly = EARTH_RADIUS_M * dy.to_radians();
    (lx * lx + ly * ly).sqrt()
}
