//! Terminal dashboard for a JSON metrics endpoint
//!
//! `core` holds the fetch, history and polling logic; `app` and `screens` are
//! the ratatui front end; `server` is an optional simulated backend.

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod server;
pub mod utils;
