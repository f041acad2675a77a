pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod service;
pub mod storage;
