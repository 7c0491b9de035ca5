pub mod body;
mod body_reader;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod handler;
pub mod job;
pub mod logging;
pub mod model;
pub mod persist;
pub mod printer;
pub mod result;
pub mod server;
pub mod system;
mod utils;
