use egui_extras::{Column, TableBuilder};
use patrol_shared::{
    location::display_timestamp,
    patrol::{Patrol, PatrolForm},
};
use patrol_time::Instant;

use super::crud::{
    ui_confirm_delete, ui_editor_window, ui_pagination, ui_row_actions, ui_toolbar, EditorFlags,
};
use crate::{
    app::wake_fn,
    screens::ListScreen,
    shortcuts::Shortcuts,
    ui_helpers::{get_text_height, readonly_checkbox_no_text, ui_toasts},
    DataShared,
};

#[derive(Debug)]
pub struct UiPatrols {
    screen: ListScreen<Patrol>,
}

impl UiPatrols {
    pub fn new(data_shared: &DataShared) -> Self {
        let settings = &data_shared.config.screens;
        Self {
            screen: ListScreen::new(
                settings.patrols_debounce(),
                settings.page_size,
                settings.toast_duration(),
            ),
        }
    }

    pub fn screen_mut(&mut self) -> &mut ListScreen<Patrol> {
        &mut self.screen
    }

    pub fn show(&mut self, ctx: &egui::Context, data_shared: &mut DataShared, shortcuts: &Shortcuts) {
        self.screen
            .tick(&data_shared.client, Instant::now(), wake_fn(ctx.clone()));
        if self.screen.take_redirect_to_login() {
            data_shared.guard.sign_out();
            return;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Patrullas");
            ui_toolbar(ui, &mut self.screen, shortcuts, "Buscar por código, alias o placa");
            ui.separator();
            self.ui_table(ui);
            ui.separator();
            ui_pagination(ui, &mut self.screen);
        });

        ui_editor_window(ctx, &mut self.screen, &data_shared.client, ui_patrol_fields);
        ui_confirm_delete(ctx, &mut self.screen, &data_shared.client, |patrol| {
            format!(
                "la patrulla {}",
                patrol.codigo.as_deref().unwrap_or("sin código")
            )
        });
        ui_toasts(ctx, "patrols", self.screen.toasts());
    }

    fn ui_table(&mut self, ui: &mut egui::Ui) {
        let text_height = get_text_height(ui);
        let items = self.screen.items().to_vec();
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto(), 5)
            .column(Column::remainder())
            .min_scrolled_height(0.0)
            .header(text_height, |mut header| {
                for title in ["Código", "Alias", "Placa", "Activa", "Creada", "Acciones"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, items.len(), |mut row| {
                    let patrol = &items[row.index()];
                    for text in [&patrol.codigo, &patrol.alias, &patrol.placa] {
                        row.col(|ui| {
                            ui.label(text.as_deref().unwrap_or("-"));
                        });
                    }
                    row.col(|ui| {
                        readonly_checkbox_no_text(ui, patrol.is_activa);
                    });
                    row.col(|ui| {
                        ui.label(display_timestamp(patrol.created_at));
                    });
                    row.col(|ui| {
                        ui_row_actions(ui, &mut self.screen, patrol);
                    });
                });
            });
    }
}

fn ui_patrol_fields(ui: &mut egui::Ui, form: &mut PatrolForm, flags: EditorFlags) {
    egui::Grid::new("patrol fields")
        .num_columns(2)
        .show(ui, |ui| {
            ui.label("Código");
            ui.add_enabled(
                !flags.identity_locked,
                egui::TextEdit::singleline(&mut form.codigo),
            )
            .on_disabled_hover_text("El código no se puede cambiar");
            ui.end_row();

            ui.label("Alias");
            ui.text_edit_singleline(&mut form.alias);
            ui.end_row();

            ui.label("Placa");
            ui.text_edit_singleline(&mut form.placa);
            ui.end_row();

            ui.label("Activa");
            ui.checkbox(&mut form.is_activa, "");
            ui.end_row();
        });
}
