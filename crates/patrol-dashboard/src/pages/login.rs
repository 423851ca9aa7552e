use std::fmt::Debug;

use futures::channel::oneshot;
use patrol_client_core::{LoginOutcome, RequestError};
use patrol_shared::{internal_error, req_args::LoginReqArgs};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::info;

use crate::{app::wake_fn, routes::Route, ui_helpers::ui_password_edit, DataShared};

type AwaitingType = oneshot::Receiver<Result<LoginOutcome, RequestError>>;

#[derive(Debug)]
pub struct UiLogin {
    password: SecretString,
    login_attempt_status: LoginAttemptStatus,
}

#[derive(Default)]
enum LoginAttemptStatus {
    #[default]
    NotAttempted,
    AwaitingResponse(AwaitingType),
    Failed(String),
    /// Waiting for the dashboard's identity check
    Success,
}

impl Debug for LoginAttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAttempted => write!(f, "NotAttempted"),
            Self::AwaitingResponse(_) => write!(f, "AwaitingResponse"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            Self::Success => write!(f, "Success"),
        }
    }
}

impl LoginAttemptStatus {
    fn is_allowed_to_login(&self) -> bool {
        match self {
            LoginAttemptStatus::NotAttempted | LoginAttemptStatus::Failed(_) => true,
            LoginAttemptStatus::AwaitingResponse(_) | LoginAttemptStatus::Success => false,
        }
    }
}

impl UiLogin {
    fn is_password_set(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    fn login_prompt(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let email_widget =
            egui::TextEdit::singleline(&mut data_shared.email).hint_text("Correo electrónico");
        let mut lost_focus = ui.add(email_widget).lost_focus();

        lost_focus =
            ui_password_edit(ui, &mut self.password, "Contraseña").lost_focus() || lost_focus;

        if lost_focus
            && is_allowed_to_login(self, &data_shared.email)
            && ui.input(|i| i.key_pressed(egui::Key::Enter))
        {
            self.send_login_attempt(ui, data_shared)
        }
    }

    fn check_login_attempt_status(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        match &mut self.login_attempt_status {
            LoginAttemptStatus::NotAttempted => {}
            LoginAttemptStatus::Success => {
                ui.spinner();
                if !data_shared.navigator.is_checking() {
                    // The guard sent us back here, start over
                    self.login_attempt_status = LoginAttemptStatus::NotAttempted;
                }
            }
            LoginAttemptStatus::AwaitingResponse(rx) => match rx.try_recv() {
                Ok(recv_opt) => match recv_opt {
                    Some(outcome_result) => {
                        self.login_attempt_status = match outcome_result {
                            Ok(LoginOutcome::Success) => {
                                info!("login accepted");
                                self.password = SecretString::from("");
                                data_shared.navigator.navigate(
                                    &data_shared.guard,
                                    Route::Dashboard,
                                    true,
                                    wake_fn(ui.ctx().clone()),
                                );
                                LoginAttemptStatus::Success
                            }
                            Ok(LoginOutcome::Rejected(message)) => {
                                info!(message, "login rejected");
                                LoginAttemptStatus::Failed(message)
                            }
                            Err(e) => {
                                info!("error returned from core-client: {e:?}");
                                LoginAttemptStatus::Failed(e.to_string())
                            }
                        };
                        ui.ctx().request_repaint();
                    }
                    None => {
                        ui.spinner();
                    }
                },
                Err(e) => {
                    self.login_attempt_status = LoginAttemptStatus::Failed(internal_error!(e));
                }
            },
            LoginAttemptStatus::Failed(e) => {
                let err_msg = format!("No se pudo iniciar sesión: {e}");
                ui.separator();
                ui.colored_label(ui.visuals().error_fg_color, err_msg);
                if ui.button("Descartar").clicked() {
                    self.login_attempt_status = LoginAttemptStatus::NotAttempted;
                }
                ui.separator();
            }
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, data_shared: &mut DataShared) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Iniciar sesión");

                self.login_prompt(ui, data_shared);

                self.check_login_attempt_status(ui, data_shared);

                self.login_button(ui, data_shared);
            });
        });
    }

    fn login_button(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if ui
            .add_enabled(
                is_allowed_to_login(self, &data_shared.email),
                egui::Button::new("Entrar"),
            )
            .clicked()
        {
            self.send_login_attempt(ui, data_shared);
        }
    }

    fn send_login_attempt(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let args = LoginReqArgs::new(data_shared.email.trim(), self.password.clone());
        let client = data_shared.client.clone();
        let rx = data_shared
            .client
            .spawn_for_ui(async move { client.login(args).await }, wake_fn(ui.ctx().clone()));
        self.login_attempt_status = LoginAttemptStatus::AwaitingResponse(rx);
    }
}

impl Default for UiLogin {
    fn default() -> Self {
        Self {
            password: SecretString::from(""),
            login_attempt_status: Default::default(),
        }
    }
}

fn is_allowed_to_login(data: &UiLogin, email: &str) -> bool {
    !email.trim().is_empty() && data.is_password_set() && data.login_attempt_status.is_allowed_to_login()
}
