//! Query Gateway - Forwards caller-supplied read queries to the store
//!
//! Fail-soft by contract: an engine failure comes back as an empty result
//! set, so callers cannot distinguish "no rows matched" from "query failed".
//! That trade is documented in the interface, not hidden.

use crate::error::{Result, TrendError};
use crate::store::PostStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Gateway for the advanced/raw query surface.
///
/// Accepts one opaque SQL string from a trusted caller and runs it verbatim
/// against the store. No validation is applied beyond rejecting empty input.
pub struct QueryGateway {
    store: Arc<PostStore>,
}

impl QueryGateway {
    pub fn new(store: Arc<PostStore>) -> Self {
        Self { store }
    }

    /// Execute `query` and return its rows.
    ///
    /// Empty or whitespace-only input fails with
    /// [`TrendError::InvalidInput`]. An engine-level failure is absorbed into
    /// `Ok(vec![])`; only store-unreachable faults propagate.
    pub fn run(&self, query: &str) -> Result<Vec<Value>> {
        if query.trim().is_empty() {
            return Err(TrendError::InvalidInput(
                "query must be a non-empty string".to_string(),
            ));
        }

        match self.store.execute_read_query(query) {
            Ok(rows) => Ok(rows),
            Err(TrendError::Query(reason)) => {
                warn!("Read query failed, returning empty result: {}", reason);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
