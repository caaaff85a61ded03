pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod state;
pub mod storage;
pub mod upload;

#[cfg(test)]
pub mod testing;
