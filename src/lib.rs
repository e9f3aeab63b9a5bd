//! Library crate for fruitris, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod input;
pub mod routes;
pub mod services;
pub mod state;
pub mod tui;
