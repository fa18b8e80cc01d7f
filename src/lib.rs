//! # pkg-converge library
//!
//! Brings the packages and package sources of a machine to a declared state. The desired
//! state is validated up front, the current state is read through a package backend, and
//! only the missing operations are planned and applied, so running twice changes nothing.

pub mod backend;
pub mod cli;
pub mod config;
pub mod desired;
pub mod engine;
pub mod logging;
