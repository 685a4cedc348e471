//! Command implementations

mod core;
mod seed;
mod suggest;

pub use core::{cmd_groups, cmd_init, cmd_serve, cmd_status, cmd_transactions, open_store};
pub use seed::cmd_seed;
pub use suggest::cmd_suggest;
