//! FHIR `ResearchStudy` wire model.
//!
//! gICS publishes each consent domain as a `ResearchStudy`. The domain name is the first
//! identifier value; domain configuration lives in extensions.

use crate::{Extension, Identifier, Resource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStudy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResearchStudyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// Publication state of a study.
///
/// Values the registry may add later deserialize as [`ResearchStudyStatus::Unknown`] so a
/// single unexpected record does not fail a whole bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResearchStudyStatus {
    Active,
    AdministrativelyCompleted,
    Approved,
    ClosedToAccrual,
    ClosedToAccrualAndIntervention,
    Completed,
    Disapproved,
    InReview,
    TemporarilyClosedToAccrual,
    TemporarilyClosedToAccrualAndIntervention,
    Withdrawn,
    #[serde(other)]
    Unknown,
}

impl ResearchStudy {
    /// Value of the first identifier, if any.
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifier.first().and_then(|i| i.value.as_deref())
    }

    /// Extensions with the given `url`, in document order.
    pub fn extensions<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a Extension> + 'a {
        self.extension.iter().filter(move |e| e.url == url)
    }

    pub fn is_active(&self) -> bool {
        self.status == Some(ResearchStudyStatus::Active)
    }
}

impl Resource for ResearchStudy {
    const RESOURCE_TYPE: &'static str = "ResearchStudy";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}
