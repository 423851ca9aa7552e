use std::f32::consts::TAU;

use egui::{Color32, Stroke};
use egui_extras::{Column, TableBuilder};
use patrol_shared::location::{display_timestamp, Kpis, TimeRange};
use patrol_time::{Instant, Timestamp};
use strum::IntoEnumIterator as _;

use crate::{
    app::wake_fn,
    dashboard::DashboardState,
    map::CanvasMap,
    shortcuts::{shortcut_button, Shortcuts},
    ui_helpers::{get_text_height, state_color},
    DataShared,
};

const DONUT_RADIUS: f32 = 36.0;
const DONUT_WIDTH: f32 = 12.0;

#[derive(Debug)]
pub struct UiDashboard {
    state: DashboardState<CanvasMap>,
    export_notice: Option<String>,
}

impl UiDashboard {
    pub fn new(data_shared: &DataShared) -> Self {
        let mut state = DashboardState::new(
            CanvasMap::default(),
            data_shared.config.dashboard.poll_interval(),
        );
        state.start(&data_shared.bus, Instant::now());
        Self {
            state,
            export_notice: None,
        }
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }

    pub fn show(&mut self, ctx: &egui::Context, data_shared: &mut DataShared, shortcuts: &Shortcuts) {
        let now = Instant::now();
        self.state
            .tick(&data_shared.client, &data_shared.bus, now, wake_fn(ctx.clone()));
        if self.state.take_redirect_to_login() {
            data_shared.guard.sign_out();
            return;
        }
        if let Some(due) = self.state.poller().next_due() {
            ctx.request_repaint_after(due.remaining(now).into());
        }

        egui::TopBottomPanel::top("kpis").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui_kpis(ui, self.state.kpis());
                ui_donut(ui, self.state.kpis());
            });
            if let Some(banner) = self.state.banner() {
                let banner = banner.to_string();
                ui.horizontal(|ui| {
                    ui.colored_label(ui.visuals().warn_fg_color, banner);
                    if ui.small_button("x").clicked() {
                        self.state.dismiss_banner();
                    }
                });
            }
        });

        egui::TopBottomPanel::bottom("locations")
            .resizable(true)
            .default_height(220.0)
            .show(ctx, |ui| self.ui_table(ui, shortcuts));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.map_mut().surface_mut().show(ui) {
                self.state.map_mut().on_resize();
            }
        });
    }

    fn ui_table(&mut self, ui: &mut egui::Ui, shortcuts: &Shortcuts) {
        ui.horizontal(|ui| {
            let mut range = self.state.range();
            egui::ComboBox::from_label("Rango")
                .selected_text(range.to_string())
                .show_ui(ui, |ui| {
                    for option in TimeRange::iter() {
                        ui.selectable_value(&mut range, option, option.to_string());
                    }
                });
            self.state.set_range(range);

            if shortcut_button(ui, "Exportar CSV", "", &shortcuts.export_csv) {
                self.export_csv(ui.ctx());
            }
            if let Some(notice) = &self.export_notice {
                ui.label(notice);
            }
        });
        ui.separator();

        let now = Timestamp::now();
        let rows = self.state.visible_rows(now);
        let text_height = get_text_height(ui);
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .min_scrolled_height(0.0)
            .header(text_height, |mut header| {
                for title in ["Patrulla", "Lat", "Lng", "Estado", "Actualizado"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, rows.len(), |mut row| {
                    let record = rows[row.index()];
                    row.col(|ui| {
                        ui.label(if record.identity.is_empty() {
                            "-"
                        } else {
                            &record.identity
                        });
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.5}", record.lat));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.5}", record.lng));
                    });
                    row.col(|ui| {
                        ui.colored_label(
                            state_color(ui, record.state),
                            record.state_label.as_deref().unwrap_or("-"),
                        );
                    });
                    row.col(|ui| {
                        ui.label(display_timestamp(record.timestamp));
                    });
                });
            });
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn export_csv(&mut self, ctx: &egui::Context) {
        let export = self.state.export_csv(Timestamp::now());
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.export_notice = Some(match crate::dashboard::save_csv(&export) {
                Ok(path) => format!("Guardado en {}", path.display()),
                Err(e) => {
                    tracing::error!(?e, "csv export failed");
                    format!("No se pudo exportar: {e}")
                }
            });
        }
        #[cfg(target_arch = "wasm32")]
        {
            ctx.copy_text(export.contents);
            self.export_notice = Some(format!("{} copiado al portapapeles", export.file_name));
        }
    }
}

fn ui_kpis(ui: &mut egui::Ui, kpis: &Kpis) {
    let card = |ui: &mut egui::Ui, title: &str, value: String| {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.vertical(|ui| {
                ui.weak(title);
                ui.heading(value);
            });
        });
    };
    card(ui, "Total", kpis.total.to_string());
    card(ui, "Activas", kpis.active.to_string());
    card(ui, "Inactivas", kpis.inactive.to_string());
    card(ui, "Última actualización", display_timestamp(kpis.latest));
}

/// Two segment ring, active then inactive, clockwise from the top
fn ui_donut(ui: &mut egui::Ui, kpis: &Kpis) {
    let size = egui::Vec2::splat(2.0 * (DONUT_RADIUS + DONUT_WIDTH));
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let center = response.rect.center();
    let active_color = Color32::from_rgb(22, 163, 74);
    let inactive_color = ui.visuals().error_fg_color;

    if kpis.total == 0 {
        painter.circle_stroke(
            center,
            DONUT_RADIUS,
            Stroke::new(DONUT_WIDTH, ui.visuals().weak_text_color()),
        );
        return;
    }
    let active_share = kpis.active as f32 / kpis.total as f32;
    let start = -TAU / 4.0;
    let split = start + TAU * active_share;
    paint_arc(&painter, center, start, split, active_color);
    paint_arc(&painter, center, split, start + TAU, inactive_color);
    response.on_hover_text(format!(
        "{} activas / {} inactivas",
        kpis.active, kpis.inactive
    ));
}

fn paint_arc(painter: &egui::Painter, center: egui::Pos2, from: f32, to: f32, color: Color32) {
    if to <= from {
        return;
    }
    let steps = ((to - from) / TAU * 64.0).ceil().max(1.0) as usize;
    let points: Vec<egui::Pos2> = (0..=steps)
        .map(|i| {
            let angle = from + (to - from) * i as f32 / steps as f32;
            center + DONUT_RADIUS * egui::vec2(angle.cos(), angle.sin())
        })
        .collect();
    painter.add(egui::Shape::line(points, Stroke::new(DONUT_WIDTH, color)));
}
