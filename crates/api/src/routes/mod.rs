//! HTTP Route Handlers

pub mod alerts;
pub mod monitoring;
pub mod parameters;
pub mod status;
