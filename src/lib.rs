pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod key_index;
pub mod model;
pub mod queue;
pub mod sequence;
pub mod sorted_index;
pub mod store;
