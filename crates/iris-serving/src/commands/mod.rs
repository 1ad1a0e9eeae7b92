pub mod manage;
pub mod package;
pub mod predict;
