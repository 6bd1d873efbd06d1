pub mod collation;
pub mod data;
pub mod endpoints;
pub mod helpers;
pub mod progress;
pub mod ranking;
pub mod store;
