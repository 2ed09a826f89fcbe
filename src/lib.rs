pub mod board;
pub mod client;
pub mod command;
pub mod config;
pub mod engine;
pub mod layout;
pub mod log_view;
pub mod palette;
pub mod roster;
pub mod server_client;
pub mod snapshot;
pub mod sync;
pub mod ui;

pub mod test_helpers;
