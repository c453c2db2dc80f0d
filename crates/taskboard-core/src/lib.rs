//! taskboard-core library.
//!
//! The pure half of taskboard: entity model, the task lifecycle engine,
//! the view-model projector, dashboard filtering and the quarterly report.
//! Nothing here touches storage; every time-dependent function takes
//! `now` explicitly so a caller samples its [`clock::Clock`] once per
//! operation.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for domain failures, `anyhow::Result`
//!   for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod clock;
pub mod completed;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod ordering;
pub mod report;
pub mod tags;
pub mod validate;
pub mod view;

#[cfg(test)]
mod testing;
