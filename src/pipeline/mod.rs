//! Parallel compilation of named search requests.

use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::query::{Query, QueryError, SearchRequest, compile_query};

/// Result of compiling one named request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRequest {
    pub name: String,
    pub result: Result<Query, QueryError>,
}

impl CompiledRequest {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Compile every request on the rayon pool; results come back in name order.
pub fn compile_requests(
    requests: &BTreeMap<String, SearchRequest>,
    flatten: bool,
) -> Vec<CompiledRequest> {
    let entries: Vec<(&String, &SearchRequest)> = requests.iter().collect();

    entries
        .par_iter()
        .map(|(name, request)| {
            let result = compile_query(request).map(|query| {
                if flatten { query.flatten() } else { query }
            });
            match &result {
                Ok(_) => tracing::trace!("Request '{}' compiled", name),
                Err(e) => tracing::error!("Request '{}' failed: {}", name, e),
            }
            CompiledRequest {
                name: (*name).clone(),
                result,
            }
        })
        .collect()
}
