//! Scheduling and dispatch core for Herald.
//!
//! Pure pieces (`classifier`, `deadline`, `validation`) sit underneath the
//! `scheduler`, which fans units out to a [`queue::DispatchQueue`], and the
//! `intake` coordinator, which ties validation, persistence, and scheduling
//! together.

pub mod classifier;
pub mod deadline;
pub mod intake;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod validation;
