use patrol_shared::location::LocationState;
use secrecy::{ExposeSecret as _, SecretString};

use crate::screens::{ToastKind, Toasts};

pub fn get_text_height(ui: &mut egui::Ui) -> f32 {
    egui::TextStyle::Body
        .resolve(ui.style())
        .size
        .max(ui.spacing().interact_size.y)
}

pub fn ui_password_edit(
    ui: &mut egui::Ui,
    password: &mut SecretString,
    hint_text: &str,
) -> egui::Response {
    let mut temp = password.expose_secret().to_owned();
    let result = ui.add(
        egui::TextEdit::singleline(&mut temp)
            .password(true)
            .hint_text(hint_text),
    );
    *password = SecretString::from(temp);
    result
}

pub fn readonly_checkbox_no_text(ui: &mut egui::Ui, mut value: bool) {
    ui.add_enabled(false, egui::Checkbox::without_text(&mut value));
}

/// Convenience function to create escape buttons
pub fn ui_escape_button(ui: &mut egui::Ui, caption: impl Into<egui::WidgetText>) -> bool {
    crate::shortcuts::shortcut_button(
        ui,
        caption,
        "",
        &egui::KeyboardShortcut::new(egui::Modifiers::NONE, egui::Key::Escape),
    )
}

pub fn state_color(ui: &egui::Ui, state: LocationState) -> egui::Color32 {
    match state {
        LocationState::Active => egui::Color32::from_rgb(22, 163, 74),
        LocationState::Inactive => ui.visuals().error_fg_color,
        LocationState::Unknown => ui.visuals().weak_text_color(),
    }
}

/// Stacks the live toasts in the bottom right corner
pub fn ui_toasts(ctx: &egui::Context, id: &str, toasts: &Toasts) {
    if toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new(("toasts", id)))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -40.0])
        .order(egui::Order::Foreground)
        .interactable(false)
        .show(ctx, |ui| {
            for toast in toasts.iter() {
                let fill = match toast.kind {
                    ToastKind::Success => egui::Color32::from_rgb(22, 101, 52),
                    ToastKind::Error => egui::Color32::from_rgb(153, 27, 27),
                };
                egui::Frame::popup(ui.style()).fill(fill).show(ui, |ui| {
                    ui.colored_label(egui::Color32::WHITE, &toast.message);
                });
            }
        });
}
