//! HTTP client for a Lunch Money–compatible ledger API.

mod client;
pub mod dto;

pub use client::HttpLedger;
