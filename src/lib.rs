// src/lib.rs
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod event_download;
pub mod event_factory;
pub mod event_form;
pub mod export;
pub mod filter;
pub mod grid;
pub mod logging;
pub mod query;
pub mod session;
pub mod ui;
pub mod user_store;
