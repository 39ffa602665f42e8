// Ai3D - interaction and message backend
// Library exports

pub mod auth;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod providers;
pub mod server;
pub mod store;
pub mod utils;
