//! Entry points selected by the config.

pub mod check;
pub mod monitor;
