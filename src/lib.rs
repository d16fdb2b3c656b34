// Library surface shared by the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod results_log;
pub mod runtime;
pub mod selector;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;
