//! Session shell for recording and reviewing pit stops.
//!
//! The [`session`] module plays the screens: a home view owning the ledger, an add form, a
//! list with search and delete, and per-pilot statistics.

pub mod commands;
pub mod config;
pub mod session;
