// src/lib.rs
pub mod cli;
pub mod commands;
pub mod report;
