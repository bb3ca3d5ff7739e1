//! FHIR `Bundle` wire model, generic over the contained resource.

use crate::Resource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A searchset bundle as returned by the registry.
///
/// Entries without a `resource` are tolerated and skipped by [`Bundle::resources`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry<T>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry<T> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub resource: Option<T>,
}

impl<T> Bundle<T> {
    /// Build a bundle containing the given resources.
    pub fn of(resources: impl IntoIterator<Item = T>) -> Self {
        Self {
            resource_type: Some("Bundle".into()),
            entry: resources
                .into_iter()
                .map(|r| BundleEntry { resource: Some(r) })
                .collect(),
        }
    }

    /// Iterate over the entries that carry a resource.
    pub fn resources(&self) -> impl Iterator<Item = &T> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }

    /// Consume the bundle, keeping the entries that carry a resource.
    pub fn into_resources(self) -> Vec<T> {
        self.entry.into_iter().filter_map(|e| e.resource).collect()
    }
}

impl<T> Default for Bundle<T> {
    fn default() -> Self {
        Self::of(std::iter::empty())
    }
}

impl<T: Serialize + DeserializeOwned> Resource for Bundle<T> {
    const RESOURCE_TYPE: &'static str = "Bundle";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, Questionnaire};

    #[test]
    fn skips_entries_without_resource() {
        let bundle = parse::<Bundle<Questionnaire>>(
            br#"{"resourceType": "Bundle", "entry": [{"bla":"blubb"}]}"#,
        )
        .expect("parse bundle");
        assert_eq!(bundle.entry.len(), 1);
        assert_eq!(bundle.resources().count(), 0);
    }

    #[test]
    fn empty_bundle_has_no_entries() {
        let bundle = parse::<Bundle<Questionnaire>>(br#"{"resourceType":"Bundle","total":0}"#)
            .expect("parse bundle");
        assert!(bundle.into_resources().is_empty());
    }
}
