//! Environment-variable configuration for deployed Reasoning Engines.
//!
//! The control plane's PATCH replaces the addressed field wholesale, so every
//! update goes through a read-modify-write pipeline: fetch the current
//! document, merge the caller's entries into the existing collection, then
//! write back only `spec.deploymentSpec.env` under an explicit update mask.
//! Sending just the new entries would silently delete everything else.
//!
//! This crate provides:
//! - [`EngineClient`], the fetch/merge/write reconciler
//! - [`TokenCache`] and [`TokenProvider`], the bearer-token lifecycle
//! - [`merge_env`] and [`remove_env`], the pure merge functions
//! - [`RetryPolicy`], bounded exponential backoff for transient failures

pub mod auth;
pub mod client;
pub mod error;
pub mod merge;
pub mod model;
pub mod retry;

pub use auth::{Credential, GcloudTokenProvider, TokenCache, TokenProvider};
pub use client::{EngineClient, EngineClientConfig};
pub use error::{EngineError, Phase, Result};
pub use merge::{merge_env, remove_env};
pub use model::{ENV_FIELD_MASK, EngineId, EnvVar, EngineSnapshot};
pub use retry::RetryPolicy;
