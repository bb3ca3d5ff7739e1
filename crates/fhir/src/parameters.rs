//! FHIR `Parameters` wire model, used as the body of registry operations.

use crate::{Coding, Identifier, Resource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<ParametersParameter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_coding: Option<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Box<Parameters>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self {
            resource_type: Some(Self::RESOURCE_TYPE.into()),
            parameter: Vec::new(),
        }
    }

    pub fn with_string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameter.push(ParametersParameter {
            name: name.into(),
            value_string: Some(value.into()),
            ..ParametersParameter::default()
        });
        self
    }

    pub fn with_boolean(mut self, name: &str, value: bool) -> Self {
        self.parameter.push(ParametersParameter {
            name: name.into(),
            value_boolean: Some(value),
            ..ParametersParameter::default()
        });
        self
    }

    pub fn with_date(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameter.push(ParametersParameter {
            name: name.into(),
            value_date: Some(value.into()),
            ..ParametersParameter::default()
        });
        self
    }

    pub fn with_identifier(mut self, name: &str, system: &str, value: &str) -> Self {
        self.parameter.push(ParametersParameter {
            name: name.into(),
            value_identifier: Some(Identifier {
                system: Some(system.into()),
                value: Some(value.into()),
            }),
            ..ParametersParameter::default()
        });
        self
    }

    pub fn with_resource(mut self, name: &str, resource: Parameters) -> Self {
        self.parameter.push(ParametersParameter {
            name: name.into(),
            resource: Some(Box::new(resource)),
            ..ParametersParameter::default()
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParametersParameter> {
        self.parameter.iter().find(|p| p.name == name)
    }
}

impl Resource for Parameters {
    const RESOURCE_TYPE: &'static str = "Parameters";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;

    #[test]
    fn renders_operation_request_body() {
        let body = Parameters::new()
            .with_identifier("personIdentifier", "urn:pid", "42")
            .with_string("domain", "MII")
            .with_resource(
                "config",
                Parameters::new().with_boolean("unknownStateIsConsideredAsDecline", true),
            );

        let json: serde_json::Value =
            serde_json::from_slice(&render(&body).expect("render")).expect("valid json");
        assert_eq!(json["resourceType"], "Parameters");
        assert_eq!(json["parameter"][0]["valueIdentifier"]["value"], "42");
        assert_eq!(json["parameter"][1]["valueString"], "MII");
        assert_eq!(
            json["parameter"][2]["resource"]["parameter"][0]["valueBoolean"],
            true
        );
    }

    #[test]
    fn looks_up_parameters_by_name() {
        let body = Parameters::new().with_date("requestDate", "2024-01-01");
        assert_eq!(
            body.get("requestDate").and_then(|p| p.value_date.as_deref()),
            Some("2024-01-01")
        );
        assert!(body.get("domain").is_none());
    }
}
