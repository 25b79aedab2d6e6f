//! Desktop configurator: part library, drop canvas and live totals

pub mod components;
pub mod constants;
mod manager;

pub use manager::run_gui;
