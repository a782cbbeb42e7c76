//! Core components of the `insider-sync` crate.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The HTTP [`InsiderClient`] and its builder.
//! - The primary [`InsiderError`] type.
//! - Environment-sourced [`PipelineConfig`].
//! - Shared data models like [`TransactionRecord`] and cell conversions.

/// The HTTP client (`InsiderClient`), builder, and retry policy.
pub mod client;
/// Environment-sourced configuration.
pub mod config;
/// Parsers for screener cell text.
pub mod conversions;
/// The primary error type (`InsiderError`) for the crate.
pub mod error;
/// Shared data models used across the pipeline.
pub mod models;

pub(crate) mod net;

// convenient re-exports so most code can just `use crate::core::InsiderClient`
pub use client::{Backoff, InsiderClient, InsiderClientBuilder, RetryConfig};
pub use config::PipelineConfig;
pub use error::InsiderError;
pub use models::{
    COLUMN_COUNT, RawRow, STAGING_HEADERS, StoredTransaction, TradeType, TransactionQuery,
    TransactionRecord, XFlag,
};
