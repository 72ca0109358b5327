//! Core domain types
//!
//! This module contains the structures shared between the HTTP clients (which
//! produce handles and payloads) and the poll driver (which consumes them).

pub mod attempt;
pub mod job;
pub mod policy;
