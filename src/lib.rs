// Library surface for the binary and the headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod mode;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod text;
pub mod theme;
pub mod ui;

pub use error::{Error, Result};
