//! Ledger engines for the vacuum-energy stack.
//!
//! This crate exposes the two state-transition engines an external sequencer
//! routes caller-identified requests into:
//!
//! * [`registry`] — mint and transfer of unique vacuum-energy device records.
//! * [`market`] — mint, buy, and sell of fungible energy units against a
//!   mutable unit price.
//! * [`ledger`] — shared identity types, the authorization helper, and the
//!   state container with snapshot/commitment support.
//!
//! The engines are intentionally small and focused: they own their maps and
//! scalars outright, every public operation either commits completely or
//! fails without touching state, and persistence of the resulting snapshots
//! is left to the sequencer.

pub mod ledger;
pub mod market;
pub mod registry;

mod error;

pub use error::LedgerError;
