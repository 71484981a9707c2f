//! Great-circle math shared by the cost model, evaluator and splicer.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Calculate distance between two points in kilometers using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2 in degrees, wrapped to [0, 360).
/// 0 = north, 90 = east.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_deg(x.atan2(y).to_degrees())
}

/// Planar heading from point 1 to point 2 in degrees (atan2 of the raw
/// coordinate deltas), wrapped to [0, 360).
pub fn planar_heading_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    normalize_deg((lon2 - lon1).atan2(lat2 - lat1).to_degrees())
}

pub fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Anything with a latitude and longitude.
pub trait Located {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;

    fn coords(&self) -> (f64, f64) {
        (self.latitude(), self.longitude())
    }

    fn distance_km_to<L: Located + ?Sized>(&self, other: &L) -> f64 {
        haversine_km(
            self.latitude(),
            self.longitude(),
            other.latitude(),
            other.longitude(),
        )
    }

    fn bearing_deg_to<L: Located + ?Sized>(&self, other: &L) -> f64 {
        bearing_deg(
            self.latitude(),
            self.longitude(),
            other.latitude(),
            other.longitude(),
        )
    }

    /// Exact coordinate equality, no tolerance.
    fn same_coordinates<L: Located + ?Sized>(&self, other: &L) -> bool {
        self.latitude() == other.latitude() && self.longitude() == other.longitude()
    }
}

impl Located for (f64, f64) {
    fn latitude(&self) -> f64 {
        self.0
    }

    fn longitude(&self) -> f64 {
        self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111.194).abs() < 0.1);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km(33.6846, -117.8265, 33.6846, -117.8265);
        assert!(dist < 1e-9);
    }

    #[test]
    fn bearing_is_wrapped_to_positive_degrees() {
        assert!(bearing_deg(0.0, 0.0, 1.0, 0.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn planar_heading_uses_raw_deltas() {
        assert!((planar_heading_deg(10.0, 10.0, 11.0, 11.0) - 45.0).abs() < 1e-9);
        assert!((planar_heading_deg(10.0, 10.0, 10.0, 9.0) - 270.0).abs() < 1e-9);
    }
}
