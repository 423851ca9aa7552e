//! Draws markers and accuracy circles on a plain Web-Mercator canvas inside egui.
//! There are no tiles, only a graticule so panning is visible

use std::collections::BTreeMap;

use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use patrol_shared::{
    const_config::client::map::{
        MAP_INITIAL_CENTER, MAP_INITIAL_ZOOM, MAP_MAX_ZOOM, MAP_MIN_ZOOM,
    },
    location::LocationState,
};
use patrol_time::{millis_between, Instant, Millis};

use super::{
    geo::{meters_per_pixel, project, unproject, zoom_to_fit, WorldPoint},
    CircleHandle, FitOptions, LatLng, LatLngBounds, MapSurface, MarkerHandle, MarkerSpec,
};

const ANIMATION_DURATION: Millis = Millis::new(600);
const MARKER_RADIUS: f32 = 7.0;
const HOVER_DISTANCE: f32 = 10.0;
/// Used until the first frame reports the real size
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);
/// Scroll points per zoom level
const SCROLL_PER_ZOOM_LEVEL: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Camera {
    center: LatLng,
    zoom: f64,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    from: Camera,
    started: Instant,
}

#[derive(Debug)]
pub struct CanvasMap {
    next_id: u64,
    markers: BTreeMap<u64, MarkerSpec>,
    circles: BTreeMap<u64, (LatLng, f64)>,
    /// Where the camera is going. Queries answer from here
    target: Camera,
    flight: Option<Flight>,
    viewport: Vec2,
}

impl Default for CanvasMap {
    fn default() -> Self {
        Self {
            next_id: 0,
            markers: Default::default(),
            circles: Default::default(),
            target: Camera {
                center: MAP_INITIAL_CENTER.into(),
                zoom: MAP_INITIAL_ZOOM,
            },
            flight: None,
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

impl CanvasMap {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Paints the map into all the space left in `ui`. Returns true when the
    /// available size changed since the previous frame
    pub fn show(&mut self, ui: &mut egui::Ui) -> bool {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let resized = rect.size() != self.viewport;
        self.viewport = rect.size();

        self.handle_input(ui, &response);

        let now = Instant::now();
        let camera = self.camera_at(now);
        if self.flight.is_some() {
            ui.ctx().request_repaint();
        }

        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);
        self.paint_graticule(&painter, rect, camera);

        let to_screen = |at: &LatLng| screen_pos(rect, camera, at);
        for (at, radius) in self.circles.values() {
            let pixels = radius / meters_per_pixel(at.lat, camera.zoom);
            painter.circle(
                to_screen(at),
                pixels as f32,
                Color32::from_rgba_unmultiplied(30, 120, 220, 40),
                Stroke::new(1.0, Color32::from_rgb(30, 120, 220)),
            );
        }

        let pointer = response.hover_pos();
        let mut hovered: Option<(f32, &str)> = None;
        for spec in self.markers.values() {
            let pos = to_screen(&spec.at);
            if !rect.expand(MARKER_RADIUS).contains(pos) {
                continue;
            }
            painter.circle(
                pos,
                MARKER_RADIUS,
                state_color(spec.state),
                Stroke::new(1.5, Color32::WHITE),
            );
            if let Some(pointer) = pointer {
                let distance = pointer.distance(pos);
                if distance <= HOVER_DISTANCE && hovered.map_or(true, |(best, _)| distance < best) {
                    hovered = Some((distance, &spec.popup));
                }
            }
        }

        if let Some((_, popup)) = hovered {
            response.on_hover_text_at_pointer(popup);
        }
        resized
    }

    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if response.dragged() {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                self.settle();
                let center = project(&self.target.center, self.target.zoom);
                self.target.center = unproject(
                    &WorldPoint {
                        x: center.x - delta.x as f64,
                        y: center.y - delta.y as f64,
                    },
                    self.target.zoom,
                );
            }
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.settle();
                self.target.zoom = (self.target.zoom + (scroll / SCROLL_PER_ZOOM_LEVEL) as f64)
                    .clamp(MAP_MIN_ZOOM, MAP_MAX_ZOOM);
            }
        }
        if response.double_clicked() {
            self.settle();
            self.target.zoom = (self.target.zoom + 1.0).clamp(MAP_MIN_ZOOM, MAP_MAX_ZOOM);
        }
    }

    /// User input wins over any flight in progress
    fn settle(&mut self) {
        self.flight = None;
    }

    fn move_to(&mut self, target: Camera, animate: bool) {
        let now = Instant::now();
        let from = self.camera_at(now);
        self.flight = animate.then_some(Flight { from, started: now });
        self.target = target;
    }

    /// Camera as drawn at `now`, partway through a flight if there is one
    fn camera_at(&mut self, now: Instant) -> Camera {
        let Some(flight) = self.flight else {
            return self.target;
        };
        let elapsed = millis_between(flight.started, now).as_u64() as f64;
        let t = elapsed / ANIMATION_DURATION.as_u64() as f64;
        if t >= 1.0 {
            self.flight = None;
            return self.target;
        }
        // Ease out
        let t = 1.0 - (1.0 - t).powi(3);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Camera {
            center: LatLng::new(
                lerp(flight.from.center.lat, self.target.center.lat),
                lerp(flight.from.center.lng, self.target.center.lng),
            ),
            zoom: lerp(flight.from.zoom, self.target.zoom),
        }
    }

    fn paint_graticule(&self, painter: &egui::Painter, rect: Rect, camera: Camera) {
        let step = graticule_step(camera.zoom);
        let stroke = Stroke::new(0.5, painter.ctx().style().visuals.weak_text_color());
        let top_left = screen_to_lat_lng(rect, camera, rect.left_top());
        let bottom_right = screen_to_lat_lng(rect, camera, rect.right_bottom());

        let mut lng = (top_left.lng / step).floor() * step;
        while lng <= bottom_right.lng {
            let x = screen_pos(rect, camera, &LatLng::new(camera.center.lat, lng)).x;
            painter.vline(x, rect.y_range(), stroke);
            lng += step;
        }
        let mut lat = (bottom_right.lat / step).floor() * step;
        while lat <= top_left.lat {
            let y = screen_pos(rect, camera, &LatLng::new(lat, camera.center.lng)).y;
            painter.hline(rect.x_range(), y, stroke);
            lat += step;
        }
    }
}

impl MapSurface for CanvasMap {
    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerHandle {
        self.next_id += 1;
        self.markers.insert(self.next_id, spec);
        MarkerHandle(self.next_id)
    }

    fn update_marker(&mut self, marker: MarkerHandle, spec: MarkerSpec) {
        self.markers.insert(marker.0, spec);
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker.0);
    }

    fn add_circle(&mut self, at: LatLng, radius_meters: f64) -> CircleHandle {
        self.next_id += 1;
        self.circles.insert(self.next_id, (at, radius_meters));
        CircleHandle(self.next_id)
    }

    fn update_circle(&mut self, circle: CircleHandle, at: LatLng, radius_meters: f64) {
        self.circles.insert(circle.0, (at, radius_meters));
    }

    fn remove_circle(&mut self, circle: CircleHandle) {
        self.circles.remove(&circle.0);
    }

    fn center(&self) -> LatLng {
        self.target.center
    }

    fn zoom(&self) -> f64 {
        self.target.zoom
    }

    fn visible_bounds(&self) -> LatLngBounds {
        let center = project(&self.target.center, self.target.zoom);
        let half_w = self.viewport.x as f64 / 2.0;
        let half_h = self.viewport.y as f64 / 2.0;
        let north_west = unproject(
            &WorldPoint {
                x: center.x - half_w,
                y: center.y - half_h,
            },
            self.target.zoom,
        );
        let south_east = unproject(
            &WorldPoint {
                x: center.x + half_w,
                y: center.y + half_h,
            },
            self.target.zoom,
        );
        LatLngBounds {
            south: south_east.lat,
            west: north_west.lng,
            north: north_west.lat,
            east: south_east.lng,
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) {
        self.move_to(
            Camera {
                center,
                zoom: zoom.clamp(MAP_MIN_ZOOM, MAP_MAX_ZOOM),
            },
            animate,
        );
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, options: FitOptions) {
        let zoom = zoom_to_fit(
            &bounds,
            self.viewport.x as f64,
            self.viewport.y as f64,
            options.padding_px,
            options.max_zoom,
        );
        self.set_view(bounds.center(), zoom, options.animate);
    }
}

fn state_color(state: LocationState) -> Color32 {
    match state {
        LocationState::Active => Color32::from_rgb(22, 163, 74),
        LocationState::Inactive => Color32::from_rgb(220, 38, 38),
        LocationState::Unknown => Color32::GRAY,
    }
}

fn screen_pos(rect: Rect, camera: Camera, at: &LatLng) -> Pos2 {
    let center = project(&camera.center, camera.zoom);
    let point = project(at, camera.zoom);
    rect.center() + Vec2::new((point.x - center.x) as f32, (point.y - center.y) as f32)
}

fn screen_to_lat_lng(rect: Rect, camera: Camera, pos: Pos2) -> LatLng {
    let center = project(&camera.center, camera.zoom);
    let offset = pos - rect.center();
    unproject(
        &WorldPoint {
            x: center.x + offset.x as f64,
            y: center.y + offset.y as f64,
        },
        camera.zoom,
    )
}

/// Degrees between grid lines, roughly four lines across the view
fn graticule_step(zoom: f64) -> f64 {
    (90.0 / 2f64.powf(zoom.floor())).max(0.0005)
}
