pub mod api;
pub mod config;
pub mod consts;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod history;
pub mod optimizer;
pub mod scheduler;
pub mod sim;
pub mod twin;
// cmd and reports belong to the binary (main.rs).
