// Library surface for the binary and the headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod passage;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timing;
pub mod ui;
