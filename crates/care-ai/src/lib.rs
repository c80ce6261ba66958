//! Care-level decision engine and the workflows surrounding it.
//!
//! The heart of the crate is [`workflows::assessment`]: a deterministic,
//! config-driven engine that turns a structured intake answer set into a
//! recommended care tier with flags, advisories, drivers, and a confidence
//! score. Everything else (configuration, telemetry, intake import, the
//! HTTP surface) exists to feed that engine or publish its output.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
