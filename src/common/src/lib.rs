pub mod cli;
pub mod config;
pub mod event;
pub mod storage;

pub use config::{Configuration, PrefixErrorPolicy};
