pub mod api;
pub mod blockchain;
pub mod blocklog;
pub mod config;
pub mod consensus;
pub mod transaction;
pub mod wallet;
