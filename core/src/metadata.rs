//! Single-attribute lookup and full dumps over a decoded dataset

use crate::dataset::StudyDataset;
use crate::error::{DicomcatError, Result};
use crate::types::AttributeCoordinate;
use dicom_core::dictionary::DataDictionary;
use dicom_dictionary_std::StandardDataDictionary;
use log::debug;
use serde_json::json;
use std::collections::BTreeMap;

/// Answer to a metadata query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataAnswer {
    /// Value of the single requested attribute
    Single {
        coordinate: AttributeCoordinate,
        value: String,
    },
    /// Every attribute keyed by `(GGGG,EEEE)`
    All(BTreeMap<String, String>),
}

impl MetadataAnswer {
    /// JSON body served to HTTP clients
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataAnswer::Single { value, .. } => json!({ "tag value": value }),
            MetadataAnswer::All(map) => json!(map),
        }
    }
}

/// Resolves an optional tag expression and answers it
///
/// An absent or empty expression selects the full dump.
pub fn query<D: StudyDataset + ?Sized>(dataset: &D, tag: Option<&str>) -> Result<MetadataAnswer> {
    match tag.filter(|t| !t.is_empty()) {
        None => Ok(MetadataAnswer::All(dump_all(dataset))),
        Some(expr) => {
            let coordinate = AttributeCoordinate::parse(expr)?;
            let value = lookup(dataset, coordinate)?;
            Ok(MetadataAnswer::Single { coordinate, value })
        }
    }
}

/// Returns the rendered value of the first element at `coordinate`
///
/// # Errors
///
/// Returns [`DicomcatError::TagNotFound`] if no element matches
pub fn lookup<D: StudyDataset + ?Sized>(
    dataset: &D,
    coordinate: AttributeCoordinate,
) -> Result<String> {
    debug!("Looking up {}", coordinate);
    dataset
        .elements()
        .into_iter()
        .find(|elem| elem.coordinate == coordinate)
        .map(|elem| elem.value)
        .ok_or_else(|| DicomcatError::TagNotFound(coordinate.to_string()))
}

/// Renders every element of the dataset
pub fn dump_all<D: StudyDataset + ?Sized>(dataset: &D) -> BTreeMap<String, String> {
    dataset
        .elements()
        .into_iter()
        .map(|elem| (elem.coordinate.to_string(), elem.value))
        .collect()
}

/// Standard dictionary keyword for a coordinate, e.g. `PatientName`
pub fn keyword(coordinate: AttributeCoordinate) -> Option<&'static str> {
    StandardDataDictionary
        .by_tag(coordinate.tag())
        .map(|entry| entry.alias)
}
