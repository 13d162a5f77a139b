pub mod config;
pub mod factory;
pub mod images;
pub mod models;
pub mod search;
pub mod sources;
