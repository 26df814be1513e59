#![forbid(unsafe_code)]

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod formats;
pub mod logging;
pub mod server;
pub mod source;
pub mod store;
pub mod sync;
pub mod tools;
