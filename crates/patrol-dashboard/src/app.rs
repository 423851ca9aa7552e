use patrol_client_core::{AppEvent, Client, EventBus, SessionGuard, Subscription, UiCallBack};
use patrol_shared::uac::{gate, GateTag, PageAccess, Role};
use patrol_time::Timestamp;
use strum::IntoEnumIterator as _;
use tracing::{error, info, warn};

use crate::{
    configuration::Configuration,
    pages::{UiDashboard, UiLogin, UiPatrols, UiUsers},
    routes::{Navigator, Route},
    shortcuts::Shortcuts,
};

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct PatrolApp {
    data_shared: DataShared,
    shortcuts: Shortcuts,
    #[serde(skip)]
    pages: Pages,
    #[serde(skip)]
    events: Option<Subscription>,
    #[serde(skip)]
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    visibility: VisibilityTracker,
}

/// Turns hidden/visible readings into events, repeated readings are dropped
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    is_hidden: bool,
}

impl VisibilityTracker {
    pub fn observe(&mut self, hidden: bool) -> Option<AppEvent> {
        if hidden == self.is_hidden {
            return None;
        }
        self.is_hidden = hidden;
        Some(AppEvent::VisibilityChanged { hidden })
    }
}

/// Only the page for the current route is kept, leaving a page drops its state
#[derive(Debug, Default)]
struct Pages {
    login: Option<UiLogin>,
    dashboard: Option<UiDashboard>,
    users: Option<UiUsers>,
    patrols: Option<UiPatrols>,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DataShared {
    /// Remembered between runs to prefill the login form
    pub email: String,

    #[serde(skip)]
    pub config: Configuration,
    #[serde(skip)]
    pub client: Client,
    #[serde(skip)]
    pub bus: EventBus,
    #[serde(skip)]
    pub guard: SessionGuard,
    #[serde(skip)]
    pub navigator: Navigator,
}

impl Default for DataShared {
    fn default() -> Self {
        let client = Client::default();
        let bus = EventBus::default();
        Self {
            email: String::new(),
            config: Configuration::default(),
            guard: SessionGuard::new(client.clone(), bus.clone()),
            client,
            bus,
            navigator: Navigator::default(),
        }
    }
}

impl DataShared {
    /// Points the client at the configured backend. Keeps the offline client
    /// if the url cannot be used
    fn configure(&mut self, config: Configuration) {
        match Client::new(&config.backend.base_url) {
            Ok(client) => {
                info!(base_url = client.base_url(), "client configured");
                self.client = client;
            }
            Err(e) => error!(?e, "failed to create client, requests will fail"),
        }
        self.bus = EventBus::default();
        self.guard = SessionGuard::new(self.client.clone(), self.bus.clone());
        self.navigator = Navigator::default();
        self.config = config;
    }

    fn role(&self) -> Role {
        self.navigator
            .session()
            .map(|session| session.role)
            .unwrap_or_default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.navigator.current() != Route::Login
    }
}

impl eframe::App for PatrolApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        info!("Saving with key: {}", eframe::APP_KEY);
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per
    /// second. Put your widgets into a `SidePanel`, `TopPanel`,
    /// `CentralPanel`, `Window` or `Area`.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(not(target_arch = "wasm32"))]
        self.track_visibility(ctx);
        self.process_events();
        if self.data_shared.navigator.tick() {
            info!(route = %self.data_shared.navigator.current(), "page changed");
        }
        self.top_panel(ctx);
        self.bottom_panel(ctx);
        self.show_page(ctx);

        // Keeps the clock in the bottom panel moving
        ctx.request_repaint_after(std::time::Duration::from_secs(1));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("shutting down");
        self.data_shared.bus.publish(AppEvent::Teardown);
    }
}

impl PatrolApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: Configuration) -> Self {
        // Load previous app state (if any).
        // Note that you must enable the `persistence` feature for this to work.
        let mut result: Self = if let Some(storage) = cc.storage {
            info!("Storage found. Loading...");
            match eframe::get_value(storage, eframe::APP_KEY) {
                Some(value) => {
                    info!("Loaded succeeded");
                    value
                }
                None => {
                    warn!("Load failed");
                    Default::default()
                }
            }
        } else {
            info!("No storage found");
            Default::default()
        };

        result.data_shared.configure(config);
        result.events = Some(result.data_shared.bus.subscribe());
        #[cfg(target_arch = "wasm32")]
        watch_page_visibility(result.data_shared.bus.clone(), cc.egui_ctx.clone());

        // A still valid session skips the login page
        let DataShared {
            guard, navigator, ..
        } = &mut result.data_shared;
        navigator.navigate(guard, Route::Dashboard, true, wake_fn(cc.egui_ctx.clone()));
        result
    }

    /// Browsers do not report minimized, see [`watch_page_visibility`]
    #[cfg(not(target_arch = "wasm32"))]
    fn track_visibility(&mut self, ctx: &egui::Context) {
        let hidden = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        if let Some(event) = self.visibility.observe(hidden) {
            self.data_shared.bus.publish(event);
        }
    }

    fn process_events(&mut self) {
        let Some(events) = &mut self.events else {
            return;
        };
        for event in events.drain() {
            match event {
                AppEvent::SignedOut => {
                    info!("signed out, back to login");
                    self.data_shared.navigator.go_to_login();
                }
                AppEvent::RoleChanged(session) => {
                    if let Some(page) = &mut self.pages.users {
                        page.screen_mut().on_role_changed(session.role);
                    }
                    if let Some(page) = &mut self.pages.patrols {
                        page.screen_mut().on_role_changed(session.role);
                    }
                }
                AppEvent::SnapshotPublished(_)
                | AppEvent::VisibilityChanged { .. }
                | AppEvent::SetPollInterval(_)
                | AppEvent::Teardown => {}
            }
        }
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                egui::widgets::global_theme_preference_switch(ui);
                if self.data_shared.is_logged_in() {
                    ui.separator();
                    self.ui_menu_file(ui, ctx);
                    ui.separator();
                    self.ui_route_buttons(ui);
                }
                if self.data_shared.navigator.is_checking() {
                    ui.spinner();
                }
                if let Some(session) = self.data_shared.navigator.session() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("{} [{}]", session.email, session.role_attr()));
                    });
                }
            });
        });
    }

    fn ui_route_buttons(&mut self, ui: &mut egui::Ui) {
        let role = self.data_shared.role();
        let current = self.data_shared.navigator.current();
        for route in Route::iter() {
            let Some(access) = route.access() else {
                continue;
            };
            if access == PageAccess::AdminRequired
                && !gate(GateTag::AdminOnly, role).is_visible()
            {
                continue;
            }
            if ui
                .selectable_label(current == route, route.to_string())
                .clicked()
                && current != route
            {
                let DataShared {
                    guard, navigator, ..
                } = &mut self.data_shared;
                navigator.navigate(guard, route, false, wake_fn(ui.ctx().clone()));
            }
        }
    }

    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    fn ui_menu_file(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.menu_button("Archivo", |ui| {
            // On the web the browser controls the zoom
            #[cfg(not(target_arch = "wasm32"))]
            {
                egui::gui_zoom::zoom_menu_buttons(ui);
                ui.weak(format!("Zoom: {:.0}%", 100.0 * ui.ctx().zoom_factor()));
                ui.separator();
            }

            if ui.button("Cerrar sesión").clicked() {
                self.logout();
                ui.close_menu();
            }

            #[cfg(not(target_arch = "wasm32"))] // no File->Quit on web pages!
            if ui.button("Salir").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    fn bottom_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::BOTTOM), |ui| {
                ui.label(Timestamp::now().display_as_locale_datetime());
                if self.data_shared.is_logged_in() {
                    if ui.button("Cerrar sesión").clicked() {
                        self.logout();
                    }
                }
                egui::warn_if_debug_build(ui);
            });
        });
    }

    fn show_page(&mut self, ctx: &egui::Context) {
        let route = self.data_shared.navigator.current();
        self.drop_pages_except(route);
        let role = self.data_shared.role();
        let data_shared = &mut self.data_shared;
        let shortcuts = &self.shortcuts;
        match route {
            Route::Login => self
                .pages
                .login
                .get_or_insert_with(Default::default)
                .show(ctx, data_shared),
            Route::Dashboard => self
                .pages
                .dashboard
                .get_or_insert_with(|| UiDashboard::new(data_shared))
                .show(ctx, data_shared, shortcuts),
            Route::Users => self
                .pages
                .users
                .get_or_insert_with(|| {
                    let mut page = UiUsers::new(data_shared);
                    page.screen_mut().on_role_changed(role);
                    page
                })
                .show(ctx, data_shared, shortcuts),
            Route::Patrols => self
                .pages
                .patrols
                .get_or_insert_with(|| {
                    let mut page = UiPatrols::new(data_shared);
                    page.screen_mut().on_role_changed(role);
                    page
                })
                .show(ctx, data_shared, shortcuts),
        }
    }

    fn drop_pages_except(&mut self, route: Route) {
        let pages = &mut self.pages;
        if route != Route::Login {
            pages.login = None;
        }
        if route != Route::Dashboard {
            if let Some(mut dashboard) = pages.dashboard.take() {
                dashboard.stop();
            }
        }
        if route != Route::Users {
            pages.users = None;
        }
        if route != Route::Patrols {
            pages.patrols = None;
        }
    }

    fn logout(&mut self) {
        self.data_shared.guard.sign_out();
        self.data_shared.navigator.go_to_login();
    }
}

/// Publishes the tab's `visibilitychange` on the bus for as long as the page
/// lives
#[cfg(target_arch = "wasm32")]
fn watch_page_visibility(bus: EventBus, ctx: egui::Context) {
    use eframe::wasm_bindgen::{closure::Closure, JsCast as _};

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        warn!("no document, page visibility not tracked");
        return;
    };
    let target = document.clone();
    let mut visibility = VisibilityTracker::default();
    let on_change = Closure::<dyn FnMut()>::new(move || {
        if let Some(event) = visibility.observe(target.hidden()) {
            bus.publish(event);
            ctx.request_repaint();
        }
    });
    if let Err(e) = document
        .add_event_listener_with_callback("visibilitychange", on_change.as_ref().unchecked_ref())
    {
        warn!(?e, "failed to watch page visibility");
        return;
    }
    on_change.forget();
}

#[inline]
pub fn wake_fn(ctx: egui::Context) -> impl UiCallBack + Clone {
    move || ctx.request_repaint()
}
