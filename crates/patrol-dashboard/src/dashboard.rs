//! Live view state: polling, KPIs, the location table and the map

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use futures::channel::oneshot;
use patrol_client_core::{AppEvent, Client, EventBus, RequestError, SnapshotEvent, UiCallBack};
use patrol_shared::{
    location::{locations_csv, Kpis, LocationRecord, LocationSnapshot, TimeRange},
    log_err_as_warn,
};
use patrol_time::{Instant, Millis, Timestamp};
use tracing::{info, warn};

use crate::{
    map::{MapRenderer, MapSurface, RenderReport},
    poller::Poller,
};

type CycleResult = Result<LocationSnapshot, RequestError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug)]
pub struct DashboardState<S> {
    poller: Poller,
    /// Oldest first. Overlapping cycles are allowed, each one renders
    cycles: Vec<oneshot::Receiver<CycleResult>>,
    kpis: Kpis,
    rows: LocationSnapshot,
    range: TimeRange,
    map: MapRenderer<S>,
    banner: Option<String>,
    redirect_to_login: bool,
    last_render: Option<RenderReport>,
}

impl<S: MapSurface> DashboardState<S> {
    pub fn new(surface: S, poll_interval: Millis) -> Self {
        Self {
            poller: Poller::new(poll_interval),
            cycles: Vec::new(),
            kpis: Kpis::default(),
            rows: Vec::new(),
            range: TimeRange::default(),
            map: MapRenderer::new(surface),
            banner: None,
            redirect_to_login: false,
            last_render: None,
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn start(&mut self, bus: &EventBus, now: Instant) {
        self.poller.start(bus, now);
    }

    pub fn stop(&mut self) {
        self.poller.stop();
    }

    pub fn kpis(&self) -> &Kpis {
        &self.kpis
    }

    pub fn rows(&self) -> &[LocationRecord] {
        &self.rows
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.range = range;
    }

    /// Inline notice about the last failed cycle
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn last_render(&self) -> Option<&RenderReport> {
        self.last_render.as_ref()
    }

    pub fn map(&self) -> &MapRenderer<S> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapRenderer<S> {
        &mut self.map
    }

    pub fn take_redirect_to_login(&mut self) -> bool {
        std::mem::take(&mut self.redirect_to_login)
    }

    pub fn cycles_in_flight(&self) -> usize {
        self.cycles.len()
    }

    /// Starts a cycle when the poller says so and applies finished ones
    pub fn tick<N: UiCallBack>(&mut self, client: &Client, bus: &EventBus, now: Instant, notify: N) {
        if self.poller.tick(now) {
            let fetcher = client.clone();
            self.cycles.push(client.spawn_for_ui(
                async move { fetcher.locations().await },
                notify,
            ));
        }

        let mut finished = Vec::new();
        self.cycles
            .retain_mut(|rx| match log_err_as_warn!(rx.try_recv(), "poll cycle dropped") {
                Some(None) => true,
                Some(Some(result)) => {
                    finished.push(result);
                    false
                }
                None => false,
            });
        for result in finished {
            self.finish_cycle(result, bus);
        }
    }

    fn finish_cycle(&mut self, result: CycleResult, bus: &EventBus) {
        match result {
            Ok(snapshot) => self.apply_snapshot(snapshot, bus),
            Err(RequestError::Unauthenticated) => {
                info!("session ended during poll");
                self.redirect_to_login = true;
            }
            Err(e) => {
                warn!(%e, "poll cycle failed, keeping previous render");
                self.banner = Some(format!("No se pudieron actualizar las ubicaciones: {e}"));
            }
        }
    }

    /// KPIs, then the table, then the map, all from the same snapshot. The
    /// event goes out last
    pub fn apply_snapshot(&mut self, snapshot: LocationSnapshot, bus: &EventBus) {
        self.kpis = Kpis::from_snapshot(&snapshot);
        self.rows = snapshot;
        self.last_render = Some(self.map.render(&self.rows));
        self.banner = None;
        bus.publish(AppEvent::SnapshotPublished(Arc::new(SnapshotEvent {
            kpis: self.kpis.clone(),
            records: self.rows.clone(),
        })));
    }

    /// Rows inside the selected time range
    pub fn visible_rows(&self, now: Timestamp) -> Vec<&LocationRecord> {
        self.range.filter(&self.rows, now)
    }

    pub fn export_csv(&self, now: Timestamp) -> CsvExport {
        CsvExport {
            file_name: self.range.csv_file_name(),
            contents: locations_csv(self.visible_rows(now), csv_timestamp),
        }
    }
}

fn csv_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| {
        DateTime::<Local>::from(ts)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
    .unwrap_or_default()
}

/// Writes the export next to the executable
#[cfg(not(target_arch = "wasm32"))]
pub fn save_csv(export: &CsvExport) -> anyhow::Result<std::path::PathBuf> {
    use anyhow::Context as _;
    let exe = std::env::current_exe().context("failed to locate executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    let path = dir.join(&export.file_name);
    std::fs::write(&path, export.contents.as_bytes())
        .with_context(|| format!("failed to write {path:?}"))?;
    info!(?path, "csv exported");
    Ok(path)
}
