//! Console configuration.
//!
//! Endpoints, page sizes, backend field names and facet labels are loaded
//! once and handed to the state machine and the backend client.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Search backend base URL
    pub api_base_url: String,
    /// Server that renders and streams stored documents
    pub file_server_url: String,
    /// Page attachment links open in a new browsing context
    pub console_url: String,
    pub request_timeout_secs: u64,
    /// Batch size for reader-mode fetches
    pub page_size: usize,
    /// Initial grid page size
    pub grid_page_size: usize,
    pub fields: FacetFields,
    pub catalog: FacetCatalog,
    pub preview: PreviewSettings,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            file_server_url: "http://localhost:8000".to_string(),
            console_url: "http://localhost:3000/SearchTest".to_string(),
            request_timeout_secs: 30,
            page_size: 10,
            grid_page_size: 10,
            fields: FacetFields::default(),
            catalog: FacetCatalog::default(),
            preview: PreviewSettings::default(),
        }
    }
}

/// Backend field names the three facets filter on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FacetFields {
    pub doc_type: String,
    pub branch: String,
    pub extension: String,
}

impl Default for FacetFields {
    fn default() -> Self {
        Self {
            doc_type: "DocType".to_string(),
            branch: "Branch".to_string(),
            extension: "FileExtension".to_string(),
        }
    }
}

/// Display labels per facet code. Codes without a label show as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FacetCatalog {
    pub doc_types: BTreeMap<String, String>,
    pub branches: BTreeMap<String, String>,
    pub extensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewSettings {
    /// Extensions previewed inline; anything else opens in a new tab.
    pub inline_extensions: Vec<String>,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            inline_extensions: vec!["doc".to_string(), "docx".to_string(), "html".to_string()],
        }
    }
}

/// The slice of configuration the state machine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub page_size: usize,
    pub grid_page_size: usize,
    pub fields: FacetFields,
}

impl Default for SearchSettings {
    fn default() -> Self {
        ConsoleConfig::default().search_settings()
    }
}

impl ConsoleConfig {
    /// Loads `path` if given, else the default location. A missing file
    /// yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docuvision").join(CONFIG_FILE))
    }

    pub fn with_api_base_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            page_size: self.page_size.max(1),
            grid_page_size: self.grid_page_size.max(1),
            fields: self.fields.clone(),
        }
    }
}
