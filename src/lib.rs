pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod idgen;
pub mod models;
pub mod redirect;
pub mod service;
pub mod storage;
