//! Core types, storage traits, and the stateful services of the crowdfunding
//! platform.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the four invariant-bearing pieces of the system:
//!
//! - [`token`]: single-use, time-limited activation and password-reset tokens.
//! - [`session`]: two independent identity slots (user, admin) per session.
//! - [`lifecycle`]: computed project status and cancellation eligibility.
//! - [`moderation`]: report-threshold content removal.
//!
//! Storage backends implement the traits in [`store`]; the web layer calls
//! into the services defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod moderation;
pub mod notify;
pub mod password;
pub mod principal;
pub mod project;
pub mod session;
pub mod store;
pub mod token;

#[cfg(test)]
mod memory;

pub use error::{Error, Result};
