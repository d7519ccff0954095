pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod exit;
pub mod explorer;
pub mod platform;
pub mod tools;
pub mod ui;
pub mod validate;
