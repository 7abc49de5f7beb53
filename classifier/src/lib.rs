pub mod app_config;
pub mod classify;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod observability;
pub mod rate_limiters;
pub mod service;
pub mod session;

#[cfg(test)]
mod testing;

pub type HttpClient = reqwest::Client;
