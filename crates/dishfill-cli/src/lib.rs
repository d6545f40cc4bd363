//! Command line front end for dishfill

pub mod cli;
pub mod commands;
pub mod output;
