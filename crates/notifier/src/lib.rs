//! Notification delivery for Herald.
//!
//! The [`worker::DispatchWorker`] claims due units from the Redis dispatch
//! queue and hands each one to the [`dispatcher::Dispatcher`], which routes
//! it to a channel transport:
//! - Email (Resend HTTP API)
//! - Telegram (Bot API `sendMessage`)
//!
//! Delivery outcomes are logged here; they never flow back to the intake
//! path, which has already answered the request.

pub mod dispatcher;
pub mod email;
pub mod telegram;
pub mod transport;
pub mod worker;
