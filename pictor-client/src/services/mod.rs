//! Remote service integrations
//!
//! One client per service. Each implements [`SubmissionClient`] and
//! [`StatusClient`] and exposes the poll policy that suits the service.
//!
//! Unknown-status handling differs per service:
//! - Segmind workflows: retried (the service adds states without notice)
//! - FASHN try-on: reported as [`PollError::UnexpectedStatus`]
//! - Replicate predictions: retried
//!
//! [`SubmissionClient`]: crate::SubmissionClient
//! [`StatusClient`]: crate::StatusClient
//! [`PollError::UnexpectedStatus`]: crate::PollError::UnexpectedStatus

pub mod fashn;
pub mod lighting;
pub mod replicate;
pub mod segmind;

pub use fashn::FashnClient;
pub use replicate::ReplicateClient;
pub use segmind::SegmindClient;
