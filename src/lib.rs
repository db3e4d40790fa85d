pub mod app;
pub mod board;
pub mod config;
pub mod controller;
pub mod engine;
pub mod history;
pub mod rules;
pub mod util;
