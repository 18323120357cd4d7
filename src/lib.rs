pub mod approval;
pub mod config;
pub mod db;
pub mod error;
pub mod exports;
pub mod models;
pub mod pipeline;
pub mod planner;
pub mod retry;
pub mod schema;
pub mod store;
pub mod tmdb;
