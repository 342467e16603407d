pub mod analyzers;
pub mod config;
pub mod frames;
pub mod grid;
pub mod input;
pub mod output;
pub mod parser;
pub mod receptors;
pub mod repair;
pub mod sfc;
pub mod stats;
pub mod timestamp;
