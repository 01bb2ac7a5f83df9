//! CLI utilities for snmp-acquire.
//!
//! This module provides command-line argument parsing and output formatting
//! for the `acq-*` CLI tools.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod output;
