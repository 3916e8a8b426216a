//! Home dashboard service.
//!
//! Fetcher jobs drop JSON snapshots (vehicle telemetry, weather, sensor
//! readings, daily messages) on shared storage. This crate assembles them
//! into a [`snapshot::DashboardSnapshot`], renders it to an e-ink friendly
//! JPEG and serves it over HTTP. A [`cache::FreshnessCache`] keyed by the
//! image's content hash lets the display client poll cheaply: when nothing
//! it would notice has changed it gets `304 Not Modified` instead of a
//! freshly rendered image.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod http;
pub mod policy;
pub mod render;
pub mod schedule;
pub mod snapshot;

pub use error::{DashError, Result};
