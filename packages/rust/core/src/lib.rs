//! Core pipeline orchestration for DrDocer.
//!
//! Ties discovery, relationship building and document rendering together
//! into the end-to-end `generate` run.

pub mod pipeline;
pub mod relate;
