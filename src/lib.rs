//! Terminal dashboard for a sales-prospect pipeline. Polls an
//! authenticated REST backend on a fixed interval and renders summary
//! metrics, the prospect list, a stage-distribution chart, and the recent
//! activity feed into named screen regions.

pub mod api;
pub mod controller;
pub mod input;
pub mod logging;
pub mod model;
pub mod render;
pub mod screen;
pub mod state;
