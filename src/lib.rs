pub mod api_error;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod http;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod telemetry;
