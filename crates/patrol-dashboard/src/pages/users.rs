use egui_extras::{Column, TableBuilder};
use patrol_shared::{
    const_config::client::screens::SCREEN_FALLBACK_ROLES,
    id::EntityId,
    location::display_timestamp,
    user::{User, UserForm},
};
use patrol_time::Instant;

use super::{
    crud::{ui_confirm_delete, ui_editor_window, ui_pagination, ui_row_actions, ui_toolbar},
    data_state::{AwaitingType, DataState},
};
use crate::{
    app::wake_fn,
    screens::{EditorMode, ListScreen},
    shortcuts::Shortcuts,
    ui_helpers::{get_text_height, readonly_checkbox_no_text, ui_toasts},
    DataShared,
};

#[derive(Debug)]
pub struct UiUsers {
    screen: ListScreen<User>,
    roles: DataState<Vec<String>>,
    /// Fresh copy of the user shown in view mode
    viewing: Option<(EntityId, DataState<User>)>,
}

impl UiUsers {
    pub fn new(data_shared: &DataShared) -> Self {
        let settings = &data_shared.config.screens;
        Self {
            screen: ListScreen::new(
                settings.users_debounce(),
                settings.page_size,
                settings.toast_duration(),
            ),
            roles: DataState::default(),
            viewing: None,
        }
    }

    pub fn screen_mut(&mut self) -> &mut ListScreen<User> {
        &mut self.screen
    }

    pub fn show(&mut self, ctx: &egui::Context, data_shared: &mut DataShared, shortcuts: &Shortcuts) {
        self.screen
            .tick(&data_shared.client, Instant::now(), wake_fn(ctx.clone()));
        if self.screen.take_redirect_to_login() || self.roles.is_unauthenticated() {
            data_shared.guard.sign_out();
            return;
        }
        if !matches!(
            self.screen.editor().map(|editor| &editor.mode),
            Some(EditorMode::View)
        ) {
            self.viewing = None;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Usuarios");
            self.ui_load_roles(ui, data_shared);
            ui_toolbar(ui, &mut self.screen, shortcuts, "Buscar por correo o nombre");
            ui.separator();
            self.ui_table(ui, data_shared);
            ui.separator();
            ui_pagination(ui, &mut self.screen);
        });

        let roles = self
            .roles
            .present()
            .cloned()
            .unwrap_or_else(|| SCREEN_FALLBACK_ROLES.map(String::from).to_vec());
        let viewed = self
            .viewing
            .as_ref()
            .and_then(|(_, state)| state.present())
            .cloned();
        ui_editor_window(ctx, &mut self.screen, &data_shared.client, |ui, form, flags| {
            ui_user_fields(ui, form, &roles, flags.read_only);
            if let Some(user) = &viewed {
                ui_user_details(ui, user);
            }
        });
        ui_confirm_delete(ctx, &mut self.screen, &data_shared.client, |user| {
            format!("al usuario {}", user.email)
        });
        ui_toasts(ctx, "users", self.screen.toasts());
    }

    fn ui_load_roles(&mut self, ui: &mut egui::Ui, data_shared: &DataShared) {
        if self.roles.is_present() {
            return;
        }
        let ctx = ui.ctx().clone();
        self.roles.get(Some(ui), Some("Recargar roles"), || {
            let client = data_shared.client.clone();
            AwaitingType(
                data_shared
                    .client
                    .spawn_for_ui(async move { client.list_roles().await }, wake_fn(ctx)),
            )
        });
    }

    fn ui_table(&mut self, ui: &mut egui::Ui, data_shared: &DataShared) {
        let text_height = get_text_height(ui);
        let items = self.screen.items().to_vec();
        let mut opened_view = None;
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
                for title in ["Correo", "Nombre", "Rol", "Activo", "Acciones"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, items.len(), |mut row| {
                    let user = &items[row.index()];
                    row.col(|ui| {
                        ui.label(&user.email);
                    });
                    row.col(|ui| {
                        ui.label(user.nombre.as_deref().unwrap_or("-"));
                    });
                    row.col(|ui| {
                        ui.label(user.role_display.as_deref().unwrap_or("-"));
                    });
                    row.col(|ui| {
                        readonly_checkbox_no_text(ui, user.is_active.unwrap_or(false));
                    });
                    row.col(|ui| {
                        let had_editor = self.screen.editor().is_some();
                        ui_row_actions(ui, &mut self.screen, user);
                        if !had_editor
                            && matches!(
                                self.screen.editor().map(|editor| &editor.mode),
                                Some(EditorMode::View)
                            )
                        {
                            opened_view = Some(user.id.clone());
                        }
                    });
                });
            });

        if let Some(id) = opened_view {
            let mut details = DataState::default();
            details.get(None, None, || {
                let client = data_shared.client.clone();
                let fetch_id = id.clone();
                AwaitingType(data_shared.client.spawn_for_ui(
                    async move { client.get_user(&fetch_id).await },
                    wake_fn(ui.ctx().clone()),
                ))
            });
            self.viewing = Some((id, details));
        } else if let Some((_, details)) = &mut self.viewing {
            // Failures just leave the list row data on screen
            if let DataState::AwaitingResponse(rx) = details {
                if let Some(new_state) = DataState::await_data(None, rx) {
                    *details = new_state;
                }
            }
        }
    }
}

fn ui_user_fields(ui: &mut egui::Ui, form: &mut UserForm, roles: &[String], read_only: bool) {
    egui::Grid::new("user fields")
        .num_columns(2)
        .show(ui, |ui| {
            ui.label("Correo");
            ui.text_edit_singleline(&mut form.email);
            ui.end_row();

            if !read_only {
                ui.label("Contraseña");
                ui.add(
                    egui::TextEdit::singleline(&mut form.password)
                        .password(true)
                        .hint_text("Vacío para no cambiarla"),
                );
                ui.end_row();
            }

            ui.label("Nombre");
            ui.text_edit_singleline(&mut form.nombre);
            ui.end_row();

            ui.label("NIP");
            ui.text_edit_singleline(&mut form.nip);
            ui.end_row();

            ui.label("Rol");
            egui::ComboBox::from_id_salt("user role")
                .selected_text(form.role.as_str())
                .show_ui(ui, |ui| {
                    for role in roles {
                        ui.selectable_value(&mut form.role, role.clone(), role);
                    }
                });
            ui.end_row();

            ui.label("Activo");
            ui.checkbox(&mut form.is_active, "");
            ui.end_row();
        });
}

fn ui_user_details(ui: &mut egui::Ui, user: &User) {
    ui.separator();
    ui.weak(format!("Id: {}", user.id));
    ui.weak(format!(
        "Creado: {}",
        display_timestamp(user.created_at)
    ));
    if let Some(roles) = (!user.roles.is_empty()).then(|| user.roles.join(", ")) {
        ui.weak(format!("Roles: {roles}"));
    }
}
