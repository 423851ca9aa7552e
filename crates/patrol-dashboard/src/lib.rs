#![warn(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
mod suppress_wasm_warnings {
    use anyhow as _; // Only the native file and config paths use it

    // Only used in binary and triggers unused warning
    use wasm_bindgen_futures as _;
    use web_sys as _;
}

#[cfg(test)] // Only used by the integration tests
mod warning_suppress {
    use patrol_test_helper as _;
    use reqwest as _;
    use serde_json as _;
}

mod app;
pub mod background_worker;
#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
pub mod configuration;
pub mod dashboard;
pub mod map;
mod pages;
pub mod poller;
pub mod routes;
pub mod screens;
mod shortcuts;
pub mod tracing;
mod ui_helpers;

pub use app::{wake_fn, DataShared, PatrolApp, VisibilityTracker};

/// Function is here to ensure lib also uses the log create to prevent the warning that it is not used
#[cfg(target_arch = "wasm32")]
pub fn wasm_log_level() -> log::LevelFilter {
    log::LevelFilter::Debug
}
