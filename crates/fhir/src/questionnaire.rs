//! FHIR `Questionnaire` and `QuestionnaireResponse` wire models.
//!
//! gICS identifies consent templates by questionnaire canonical URLs of the form
//! `.../ConsentTemplate/<domain>/<template>|<version>`; signed documents reference them
//! through `QuestionnaireResponse.questionnaire`.

use crate::{Coding, Resource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<Coding>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaire: Option<String>,
}

impl Questionnaire {
    pub fn has_code(&self, system: &str, code: &str) -> bool {
        self.code.iter().any(|c| c.is(system, code))
    }

    /// Template identifier: the last path segment of the canonical URL.
    pub fn template_id(&self) -> Option<&str> {
        self.url.as_deref().and_then(last_segment)
    }
}

impl QuestionnaireResponse {
    /// Template identifier of the answered questionnaire.
    pub fn template_id(&self) -> Option<&str> {
        self.questionnaire.as_deref().and_then(last_segment)
    }
}

fn last_segment(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl Resource for Questionnaire {
    const RESOURCE_TYPE: &'static str = "Questionnaire";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

impl Resource for QuestionnaireResponse {
    const RESOURCE_TYPE: &'static str = "QuestionnaireResponse";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}
