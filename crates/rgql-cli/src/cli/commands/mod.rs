//! CLI command handlers, one file per command.

mod classify;
mod config;
mod delays;
mod operation;

pub use classify::run_classify;
pub use config::run_config;
pub use delays::run_delays;
pub use operation::{run_operation, OperationKind};

#[cfg(test)]
pub(crate) use operation::{load_document, parse_variables};
