pub mod config;
pub mod constants;
#[cfg(feature = "db")]
pub mod db;
pub mod domain;
pub mod error;
pub mod graphql;
pub mod logging;
#[cfg(feature = "db")]
pub mod migrations;
pub mod openapi;
pub mod relations;
pub mod rest;
pub mod server;
pub mod service;
pub mod storage;
