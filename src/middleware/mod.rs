//! Middleware module - bearer-token authentication for the job routes

pub mod auth;
