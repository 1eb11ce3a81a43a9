// Great-circle distance on a spherical Earth

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1.0 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: (f64, f64) = (40.7128, -74.0060);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn same_point_has_zero_distance() {
        let points = [
            (0.0, 0.0),
            NEW_YORK,
            LONDON,
            (90.0, 180.0),
            (-90.0, -180.0),
            (-33.8688, 151.2093),
        ];
        for (lat, lon) in points {
            assert!(distance_km(lat, lon, lat, lon).abs() < 1e-9, "{lat},{lon}");
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (NEW_YORK, LONDON),
            ((0.0, 0.0), (0.0, 180.0)),
            ((-45.0, 170.0), (45.0, -170.0)),
            ((89.9, 10.0), (-89.9, -10.0)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let forward = distance_km(lat1, lon1, lat2, lon2);
            let backward = distance_km(lat2, lon2, lat1, lon1);
            assert!((forward - backward).abs() < 1e-9);
        }
    }

    #[test]
    fn new_york_to_london_matches_known_distance() {
        let distance = distance_km(NEW_YORK.0, NEW_YORK.1, LONDON.0, LONDON.1);
        assert!((distance - 5570.0).abs() <= 20.0, "got {distance}");
    }

    #[test]
    fn short_hop_in_new_york_is_about_one_and_a_half_km() {
        let distance = distance_km(NEW_YORK.0, NEW_YORK.1, 40.7228, -74.0160);
        assert!((distance - 1.4).abs() < 0.1, "got {distance}");
    }

    #[test]
    fn antipodal_points_are_half_circumference_apart() {
        let distance = distance_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!(!distance.is_nan());
        assert!((distance - half).abs() < 1e-6);
    }
}
