use crate::models::{LatLng, TransportMode};

/// Kilometers per degree of latitude
const KM_PER_DEG_LAT: f64 = 111.0;

/// Kilometers per degree of longitude at the mid-northern latitudes this
/// service targets (~cos 48.9°). City-scale accuracy only.
const KM_PER_DEG_LNG: f64 = 73.0;

/// Flat-earth distance between two points in kilometers
///
/// Not a geodesic calculation: longitude degrees are scaled by a fixed
/// correction factor, which holds up over city-scale separations.
#[inline]
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let dy = (b.lat - a.lat) * KM_PER_DEG_LAT;
    let dx = (b.lng - a.lng) * KM_PER_DEG_LNG;
    (dx * dx + dy * dy).sqrt()
}

/// Offset a point by kilometers east and north
#[inline]
pub fn offset_by_km(origin: LatLng, east_km: f64, north_km: f64) -> LatLng {
    LatLng {
        lat: origin.lat + north_km / KM_PER_DEG_LAT,
        lng: origin.lng + east_km / KM_PER_DEG_LNG,
    }
}

/// Fixed average speed per transport mode in km/h
#[inline]
pub fn average_speed_kmh(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Walking => 5.0,
        TransportMode::Bicycling => 15.0,
        TransportMode::Transit => 20.0,
        TransportMode::Driving => 30.0,
    }
}

/// Estimated travel time in minutes for a straight-line distance
///
/// Heuristic used to pick a search center and as a last-resort estimate.
/// Measured times from the travel-time service always take precedence.
#[inline]
pub fn estimate_travel_minutes(distance_km: f64, mode: TransportMode) -> f64 {
    distance_km / average_speed_kmh(mode) * 60.0
}
