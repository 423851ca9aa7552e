//! Types shared by the dashboard crates: endpoints, session and role model,
//! location snapshots and the adapters that read the backend's JSON

#![warn(unused_crate_dependencies)]

pub mod const_config;
pub mod errors;
pub mod id;
pub mod location;
mod macros;
pub mod paging;
pub mod patrol;
pub mod req_args;
pub mod uac;
pub mod user;
pub mod wire;

#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;

