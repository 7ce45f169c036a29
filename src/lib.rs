//! Coverage Explorer library
//!
//! Read-only explorer API over a proof-of-coverage ledger database, served
//! through a cache-aside layer.

pub mod activity;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod rewards;
pub mod routes;
pub mod services;
pub mod status;
