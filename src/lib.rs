pub mod adaptive;
pub mod config;
pub mod constants;
pub mod extractors;
pub mod logging;
pub mod matching;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
pub mod store;
