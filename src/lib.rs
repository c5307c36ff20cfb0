pub mod assemble;
pub mod audit;
pub mod cli;
pub mod config;
pub mod coords;
pub mod db;
pub mod engine;
pub mod error;
pub mod family;
pub mod job;
pub mod logging;
pub mod model;
pub mod request;
pub mod rpc;
pub mod schema;
pub mod stats;
