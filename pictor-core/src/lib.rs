//! Pictor Core
//!
//! Core types and abstractions for submitting image jobs to remote services
//! and waiting for them to finish.
//!
//! This crate contains:
//! - Domain types: Job handles, normalized statuses, results, attempts, policies
//! - Vocabularies: How each remote service names its job states and where the
//!   interesting fields live in its status payloads
//! - The poll state machine: Pure transition logic shared by every poll driver
//!
//! Nothing in here performs I/O. The HTTP clients and the async driver live in
//! `pictor-client`.

pub mod domain;
pub mod machine;
pub mod vocabulary;

pub use domain::attempt::{AttemptOutcome, PollAttempt};
pub use domain::job::{HandleError, JobHandle, JobResult, JobStatus};
pub use domain::policy::{PolicyError, PollPolicy, TransportErrorPolicy, UnknownStatusPolicy};
pub use machine::{Observation, PollMachine, Step, Termination};
pub use vocabulary::{PayloadSchema, ServiceProfile, StatusVocabulary};
