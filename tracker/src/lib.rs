//! Tracker - production order board for a textile workshop
//!
//! Orders move through a fixed sequence of stages; the library computes each
//! stage's capacity balance, manages per-order tasks and bulk-loads orders and
//! employees from spreadsheets.

pub mod api;
pub mod capacity;
pub mod config;
pub mod entity;
pub mod import;
pub mod template;
