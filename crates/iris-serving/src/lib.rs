//! iris-serving: command-line packaging and HTTP serving for the Iris classifier.
pub mod commands;
pub mod server;
pub mod util;
