//! MicroLend Backend Library
//!
//! Core modules for the MicroLend micro-lending server: lending rules,
//! application and loan workflows, authentication and the HTTP layer.

pub mod analytics;
pub mod application;
pub mod auth;
pub mod config;
pub mod contact;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lending;
pub mod loan;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod routes;
pub mod settings;
pub mod state;
pub mod user;
