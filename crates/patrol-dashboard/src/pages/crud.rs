//! Widgets shared by the user and patrol screens

use patrol_client_core::Client;
use patrol_shared::const_config::client::screens::SCREEN_PAGE_SIZES;
use patrol_time::Instant;

use crate::{
    app::wake_fn,
    screens::{CrudEntity, EditorMode, ListScreen},
    shortcuts::{shortcut_button_enabled, Shortcuts},
    ui_helpers::ui_escape_button,
};

const DISABLED_HINT: &str = "Solo administradores";

/// Search box, page size and the create button
pub fn ui_toolbar<E: CrudEntity>(
    ui: &mut egui::Ui,
    screen: &mut ListScreen<E>,
    shortcuts: &Shortcuts,
    search_hint: &str,
) {
    ui.horizontal_wrapped(|ui| {
        let mut search = screen.search_input().to_string();
        if ui
            .add(egui::TextEdit::singleline(&mut search).hint_text(search_hint))
            .changed()
        {
            screen.set_search_input(search, Instant::now());
        }

        let mut size = screen.query().size;
        egui::ComboBox::from_id_salt(("page size", E::LABEL))
            .selected_text(format!("{size} por página"))
            .show_ui(ui, |ui| {
                for option in SCREEN_PAGE_SIZES {
                    ui.selectable_value(&mut size, option, option.to_string());
                }
            });
        screen.set_page_size(size);

        if ui.button("Recargar").clicked() {
            screen.request_reload();
        }

        let can_edit = screen.can_edit();
        let hint = if can_edit { "" } else { DISABLED_HINT };
        if shortcut_button_enabled(ui, can_edit, "Nuevo", hint, &shortcuts.new_record) {
            screen.open_create();
        }

        if screen.is_loading() {
            ui.spinner();
        }
    });
    if let Some(error) = screen.load_error() {
        ui.colored_label(ui.visuals().error_fg_color, error);
    }
}

pub fn ui_pagination<E: CrudEntity>(ui: &mut egui::Ui, screen: &mut ListScreen<E>) {
    let pagination = screen.pagination();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(pagination.has_previous(), egui::Button::new("◀ Anterior"))
            .clicked()
        {
            screen.previous_page();
        }
        ui.label(format!(
            "Página {} de {} ({} en total)",
            pagination.page,
            pagination.page_count(),
            pagination.total
        ));
        if ui
            .add_enabled(pagination.has_next(), egui::Button::new("Siguiente ▶"))
            .clicked()
        {
            screen.next_page();
        }
    });
}

/// Edit and delete for one row, disabled for non admins
pub fn ui_row_actions<E: CrudEntity>(ui: &mut egui::Ui, screen: &mut ListScreen<E>, item: &E) {
    if E::ALLOWS_VIEW && ui.small_button("Ver").clicked() {
        screen.open_view(item);
    }
    let can_edit = screen.can_edit();
    if ui
        .add_enabled(can_edit, egui::Button::new("Editar").small())
        .on_disabled_hover_text(DISABLED_HINT)
        .clicked()
    {
        screen.open_edit(item);
    }
    if ui
        .add_enabled(can_edit, egui::Button::new("Eliminar").small())
        .on_disabled_hover_text(DISABLED_HINT)
        .clicked()
    {
        screen.ask_delete(item);
    }
}

/// Second step of a delete
pub fn ui_confirm_delete<E: CrudEntity>(
    ctx: &egui::Context,
    screen: &mut ListScreen<E>,
    client: &Client,
    describe: impl Fn(&E) -> String,
) {
    let Some(item) = screen.pending_delete() else {
        return;
    };
    let description = describe(item);
    egui::Window::new(format!("Eliminar {}", E::LABEL.to_lowercase()))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!("¿Eliminar {description}? Esta acción no se puede deshacer."));
            ui.horizontal(|ui| {
                if ui.button("Eliminar").clicked() {
                    screen.confirm_delete(client, wake_fn(ctx.clone()));
                }
                if ui_escape_button(ui, "Cancelar") {
                    screen.cancel_delete();
                }
            });
        });
}

/// Frame for the create / edit / view dialog. `body` draws the fields and
/// gets told whether they are read only. Returns nothing, the screen keeps
/// track of what happened
pub fn ui_editor_window<E: CrudEntity>(
    ctx: &egui::Context,
    screen: &mut ListScreen<E>,
    client: &Client,
    body: impl FnOnce(&mut egui::Ui, &mut E::Form, EditorFlags),
) {
    let Some(editor) = screen.editor() else {
        return;
    };
    let flags = EditorFlags {
        read_only: editor.is_read_only(),
        identity_locked: editor.is_identity_locked(),
    };
    let title = match &editor.mode {
        EditorMode::Create => format!("Nuevo {}", E::LABEL.to_lowercase()),
        EditorMode::Edit(_) => format!("Editar {}", E::LABEL.to_lowercase()),
        EditorMode::View => E::LABEL.to_string(),
    };
    let mut form = editor.form.clone();
    let mut close = false;
    let mut submit = false;
    egui::Window::new(title)
        .id(egui::Id::new(("editor", E::LABEL)))
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_enabled_ui(!flags.read_only, |ui| body(ui, &mut form, flags));
            ui.separator();
            ui.horizontal(|ui| {
                if !flags.read_only && ui.button("Guardar").clicked() {
                    submit = true;
                }
                if ui_escape_button(ui, if flags.read_only { "Cerrar" } else { "Cancelar" }) {
                    close = true;
                }
            });
        });
    if let Some(target) = screen.editor_form_mut() {
        *target = form;
    }
    if close {
        screen.close_editor();
    } else if submit {
        screen.submit_editor(client, Instant::now(), wake_fn(ctx.clone()));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditorFlags {
    pub read_only: bool,
    pub identity_locked: bool,
}
