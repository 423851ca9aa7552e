//! Coordinates, bounding boxes and the Web-Mercator projection

use std::f64::consts::PI;

use patrol_shared::location::LocationRecord;

/// Mean earth radius used for distances
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
/// Size in pixels of the whole world at zoom 0
const WORLD_SIZE_AT_ZOOM_0: f64 = 256.0;
/// Mercator is undefined at the poles
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great circle distance (haversine)
    pub fn distance_meters(&self, other: &LatLng) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

impl From<&LocationRecord> for LatLng {
    fn from(value: &LocationRecord) -> Self {
        Self::new(value.lat, value.lng)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// `None` when there are no points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut result = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for point in points {
            result.extend(point);
        }
        Some(result)
    }

    pub fn extend(&mut self, point: &LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }

    pub fn contains_bounds(&self, other: &LatLngBounds) -> bool {
        self.contains(&LatLng::new(other.south, other.west))
            && self.contains(&LatLng::new(other.north, other.east))
    }

    /// Grows each side by `ratio` of the size. A negative ratio shrinks
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = (self.north - self.south).abs() * ratio;
        let lng_buffer = (self.east - self.west).abs() * ratio;
        Self {
            south: self.south - lat_buffer,
            west: self.west - lng_buffer,
            north: self.north + lat_buffer,
            east: self.east + lng_buffer,
        }
    }
}

/// Position on the world plane in pixels at a given zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

pub fn world_size(zoom: f64) -> f64 {
    WORLD_SIZE_AT_ZOOM_0 * 2f64.powf(zoom)
}

pub fn project(point: &LatLng, zoom: f64) -> WorldPoint {
    let scale = world_size(zoom);
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let sin_lat = lat.sin();
    WorldPoint {
        x: (point.lng + 180.0) / 360.0 * scale,
        y: (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * scale,
    }
}

pub fn unproject(point: &WorldPoint, zoom: f64) -> LatLng {
    let scale = world_size(zoom);
    let n = PI - 2.0 * PI * point.y / scale;
    LatLng::new(
        n.sinh().atan().to_degrees(),
        point.x / scale * 360.0 - 180.0,
    )
}

/// Ground distance covered by one pixel at `lat`
pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    2.0 * PI * EARTH_RADIUS_METERS * lat.to_radians().cos() / world_size(zoom)
}

/// Largest whole zoom at which `bounds` fits in `width` x `height` pixels after
/// removing `padding` on every side. Capped at `max_zoom`
pub fn zoom_to_fit(
    bounds: &LatLngBounds,
    width: f64,
    height: f64,
    padding: f64,
    max_zoom: f64,
) -> f64 {
    let north_west = project(&LatLng::new(bounds.north, bounds.west), 0.0);
    let south_east = project(&LatLng::new(bounds.south, bounds.east), 0.0);
    let span_x = (south_east.x - north_west.x).abs();
    let span_y = (south_east.y - north_west.y).abs();
    let available_x = (width - 2.0 * padding).max(1.0);
    let available_y = (height - 2.0 * padding).max(1.0);
    let ratio = match (span_x > 0.0, span_y > 0.0) {
        (false, false) => return max_zoom,
        (true, false) => available_x / span_x,
        (false, true) => available_y / span_y,
        (true, true) => (available_x / span_x).min(available_y / span_y),
    };
    ratio.log2().floor().min(max_zoom)
}
