// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the external tool with `tokio::process::Command` and
//! aggregates exit status plus captured output into an
//! [`Outcome`](crate::job::Outcome).
//!
//! - [`runner`] spawns the child, wires both drains, and waits for exit.
//! - [`drain`] owns the stream-consumption loop shared by stdout and stderr.

pub mod drain;
pub mod runner;

pub use runner::run;
