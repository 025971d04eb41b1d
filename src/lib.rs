// src/lib.rs — Library root for skillbench

pub mod cli;
pub mod evaluator;
pub mod infra;
pub mod provider;
pub mod skills;
