use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

static QUALIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[(（][^)）]*[)）]").expect("qualifier regex"));

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read facility dataset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("facility dataset {path} is malformed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FacilityDataset {
    #[serde(rename = "campus_facilities", default)]
    pub buildings: Vec<Building>,
    /// The document as read, keys the typed tree does not model included.
    #[serde(skip)]
    document: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Building {
    #[serde(rename = "building_name")]
    pub name: String,
    #[serde(
        rename = "image_url",
        alias = "imageUrl",
        alias = "image",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(default)]
    pub floors: Vec<Floor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Floor {
    #[serde(rename = "floor")]
    pub label: String,
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl FacilityDataset {
    pub fn new(buildings: Vec<Building>) -> Self {
        Self {
            buildings,
            document: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(raw)?;
        let mut dataset = Self::deserialize(&document)?;
        dataset.document = Some(document);
        Ok(dataset)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&raw).map_err(|source| DatasetError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Pretty JSON of the loaded document with key order and Hangul kept.
    /// Datasets built in code fall back to the typed tree.
    pub fn to_prompt_json(&self) -> String {
        match &self.document {
            Some(document) => serde_json::to_string_pretty(document),
            None => serde_json::to_string_pretty(self),
        }
        .unwrap_or_default()
    }
}

/// Loads the dataset for the lifetime of the process. Any fault is logged
/// and the caller continues without facility data.
pub fn load_dataset_or_warn(path: impl AsRef<Path>) -> Option<Arc<FacilityDataset>> {
    match FacilityDataset::load(path) {
        Ok(dataset) => {
            tracing::info!(buildings = dataset.buildings.len(), "facility dataset loaded");
            Some(Arc::new(dataset))
        }
        Err(err) => {
            tracing::warn!("continuing without facility data: {err}");
            None
        }
    }
}

impl Building {
    /// Name with any parenthetical qualifier such as "(본관)" removed.
    pub fn match_name(&self) -> String {
        strip_qualifier(&self.name)
    }

    /// Floors that list at least one facility, in dataset order.
    pub fn stocked_floors(&self) -> impl Iterator<Item = &Floor> {
        self.floors
            .iter()
            .filter(|floor| !floor.facilities.is_empty())
    }
}

fn strip_qualifier(name: &str) -> String {
    QUALIFIER_RE.replace_all(name, "").trim().to_string()
}
