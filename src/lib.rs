pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod crud;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod realtime;
pub mod resources;
pub mod types;
