pub mod config;
pub mod db;
pub mod error;
pub mod plan;
pub mod types;
