//! Client for EMBL-EBI asynchronous job services.
//!
//! One [`AsyncJobClient`](lifecycle::AsyncJobClient) drives any tool whose
//! parameters are described by a [`ToolSchema`](schema::ToolSchema): submit a
//! job, poll its status with a doubling interval, then fetch and write its
//! results.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod job;
pub mod lifecycle;
pub mod params;
pub mod runner;
pub mod schema;
pub mod service;
pub mod ui;

pub use error::{JobError, Result};
