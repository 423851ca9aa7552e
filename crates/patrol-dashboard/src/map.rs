//! Keeps the markers on the map in step with the latest snapshot and moves the
//! camera so the patrols stay in view

use std::collections::BTreeMap;

use patrol_shared::{
    const_config::client::map::{
        MAP_FIT_MAX_ZOOM, MAP_FIT_PADDING_PX, MAP_RECENTER_THRESHOLD_METERS, MAP_SAFE_VIEW_MARGIN,
        MAP_SINGLE_POINT_MAX_ZOOM, MAP_SINGLE_POINT_MIN_ZOOM,
    },
    location::{LocationRecord, LocationState},
};
use tracing::debug;

mod canvas;
mod geo;

pub use canvas::CanvasMap;
pub use geo::{LatLng, LatLngBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CircleHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub at: LatLng,
    pub popup: String,
    pub state: LocationState,
}

impl From<&LocationRecord> for MarkerSpec {
    fn from(value: &LocationRecord) -> Self {
        Self {
            at: value.into(),
            popup: value.popup_text(),
            state: value.state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub padding_px: f64,
    pub max_zoom: f64,
    pub animate: bool,
}

/// What the renderer needs from whatever actually draws the map
pub trait MapSurface {
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerHandle;
    fn update_marker(&mut self, marker: MarkerHandle, spec: MarkerSpec);
    fn remove_marker(&mut self, marker: MarkerHandle);

    fn add_circle(&mut self, at: LatLng, radius_meters: f64) -> CircleHandle;
    fn update_circle(&mut self, circle: CircleHandle, at: LatLng, radius_meters: f64);
    fn remove_circle(&mut self, circle: CircleHandle);

    fn center(&self) -> LatLng;
    fn zoom(&self) -> f64;
    fn visible_bounds(&self) -> LatLngBounds;
    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool);
    fn fit_bounds(&mut self, bounds: LatLngBounds, options: FitOptions);
}

/// Keys touched by one render, sorted
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug)]
pub struct MapRenderer<S> {
    surface: S,
    markers: BTreeMap<String, MarkerHandle>,
    circles: BTreeMap<String, CircleHandle>,
    has_fitted: bool,
    last_points: Vec<LatLng>,
}

impl<S: MapSurface> MapRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            markers: Default::default(),
            circles: Default::default(),
            has_fitted: false,
            last_points: Default::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn marker_keys(&self) -> impl Iterator<Item = &str> {
        self.markers.keys().map(String::as_str)
    }

    pub fn circle_keys(&self) -> impl Iterator<Item = &str> {
        self.circles.keys().map(String::as_str)
    }

    /// Reconciles markers and accuracy circles with `snapshot` then frames.
    /// When a key repeats the last record with it wins
    #[tracing::instrument(skip_all, fields(records = snapshot.len()))]
    pub fn render(&mut self, snapshot: &[LocationRecord]) -> RenderReport {
        let mut latest: BTreeMap<String, &LocationRecord> = BTreeMap::new();
        for record in snapshot {
            latest.insert(record.marker_key(), record);
        }

        let mut report = RenderReport::default();
        let absent: Vec<String> = self
            .markers
            .keys()
            .filter(|key| !latest.contains_key(*key))
            .cloned()
            .collect();
        for key in absent {
            if let Some(marker) = self.markers.remove(&key) {
                self.surface.remove_marker(marker);
                report.removed.push(key);
            }
        }
        let stale_circles: Vec<String> = self
            .circles
            .keys()
            .filter(|key| {
                latest
                    .get(*key)
                    .and_then(|record| record.accuracy_radius())
                    .is_none()
            })
            .cloned()
            .collect();
        for key in stale_circles {
            if let Some(circle) = self.circles.remove(&key) {
                self.surface.remove_circle(circle);
            }
        }

        for (key, record) in latest.iter() {
            let spec = MarkerSpec::from(*record);
            match self.markers.get(key) {
                Some(marker) => {
                    self.surface.update_marker(*marker, spec);
                    report.updated.push(key.clone());
                }
                None => {
                    let marker = self.surface.add_marker(spec);
                    self.markers.insert(key.clone(), marker);
                    report.created.push(key.clone());
                }
            }
            if let Some(radius) = record.accuracy_radius() {
                let at = LatLng::from(*record);
                match self.circles.get(key) {
                    Some(circle) => self.surface.update_circle(*circle, at, radius),
                    None => {
                        let circle = self.surface.add_circle(at, radius);
                        self.circles.insert(key.clone(), circle);
                    }
                }
            }
        }

        self.last_points = latest.values().map(|record| LatLng::from(*record)).collect();
        self.frame();
        debug!(?report, "map rendered");
        report
    }

    /// Frames the last rendered points again, for example after the viewport
    /// changed size
    pub fn on_resize(&mut self) {
        self.frame();
    }

    fn frame(&mut self) {
        match self.last_points.as_slice() {
            [] => {}
            [point] => {
                let zoom = self
                    .surface
                    .zoom()
                    .clamp(MAP_SINGLE_POINT_MIN_ZOOM, MAP_SINGLE_POINT_MAX_ZOOM);
                self.surface.set_view(*point, zoom, true);
            }
            points => {
                let Some(bounds) = LatLngBounds::from_points(points) else {
                    return;
                };
                if !self.has_fitted {
                    self.has_fitted = true;
                    self.surface.fit_bounds(bounds, fit_options(false));
                    return;
                }
                let safe_view = self.surface.visible_bounds().pad(-MAP_SAFE_VIEW_MARGIN);
                if !safe_view.contains_bounds(&bounds) {
                    self.surface.fit_bounds(bounds, fit_options(true));
                } else if self.surface.center().distance_meters(&bounds.center())
                    > MAP_RECENTER_THRESHOLD_METERS
                {
                    let zoom = self.surface.zoom();
                    self.surface.set_view(bounds.center(), zoom, true);
                }
            }
        }
    }
}

fn fit_options(animate: bool) -> FitOptions {
    FitOptions {
        padding_px: MAP_FIT_PADDING_PX,
        max_zoom: MAP_FIT_MAX_ZOOM,
        animate,
    }
}
