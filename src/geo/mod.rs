use crate::models::coordinate::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres. Inputs are not range-checked.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    // Rounding can push the term a hair past 1 for antipodal points; asin
    // would then return NaN.
    let haversine =
        (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).clamp(0.0, 1.0);
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Sum of the legs between consecutive points.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance_km(&leg[0], &leg[1]))
        .sum()
}
