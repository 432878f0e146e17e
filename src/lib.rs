#![allow(clippy::result_large_err)]

pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod provider;
pub mod scan;
