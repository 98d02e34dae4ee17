use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::query::SearchRequest;

/// Batch file of named search requests.
#[derive(Debug, Deserialize, Serialize)]
pub struct RequestsConfig {
    pub requests: BTreeMap<String, SearchRequest>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RequestsConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<OutputFormat>,
    /// Render search-index tokens instead of canonical queries.
    #[serde(default)]
    pub token: bool,
    /// Flatten nested `And`/`Or` chains.
    #[serde(default)]
    pub flatten: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}
