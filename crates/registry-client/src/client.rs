//! HTTP client for the gICS FHIR API.

use crate::mapping::provision_record;
use crate::{RegistryError, RegistryResult};
use async_trait::async_trait;
use consent_core::constants::{TEMPLATE_TYPE_SYSTEM, WITHDRAWAL_TEMPLATE_TYPE};
use consent_core::{BasicAuth, DirectoryError, Domain, PolicyDirectoryClient, ProvisionRecord};
use fhir::{
    Bundle, Consent, Parameters, Questionnaire, QuestionnaireResponse, ResearchStudy, Resource,
};
use reqwest::{header, Client, Method, RequestBuilder};
use std::time::Duration;

const FHIR_JSON: &str = "application/fhir+json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const POLICY_STATES_OPERATION: &str = "$currentPolicyStatesForPerson";

pub struct GicsClient {
    http: Client,
    base: String,
    auth: Option<BasicAuth>,
}

impl GicsClient {
    /// Create a client for the FHIR endpoint at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Request`] if the HTTP client cannot be built.
    pub fn new(base: &str, auth: Option<BasicAuth>) -> RegistryResult<Self> {
        Self::with_timeout(base, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base: &str,
        auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> RegistryResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_owned(),
            auth,
        })
    }

    pub fn from_config(config: &consent_core::config::Fhir) -> RegistryResult<Self> {
        Self::new(&config.base, config.auth.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, FHIR_JSON);
        match &self.auth {
            Some(auth) => builder.basic_auth(&auth.user, Some(&auth.password)),
            None => builder,
        }
    }

    async fn fetch<R: Resource>(&self, request: RequestBuilder) -> RegistryResult<R> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(RegistryError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(fhir::parse(&body)?)
    }

    /// All `ResearchStudy` resources, i.e. the registry's domains.
    pub async fn domains(&self) -> RegistryResult<Vec<ResearchStudy>> {
        let bundle: Bundle<ResearchStudy> =
            self.fetch(self.request(Method::GET, "ResearchStudy")).await?;
        Ok(bundle.into_resources())
    }

    /// Current policy states of `patient_id` within `domain`.
    pub async fn policy_states(
        &self,
        patient_id: &str,
        domain: &Domain,
    ) -> RegistryResult<Vec<ProvisionRecord>> {
        let body = Parameters::new()
            .with_identifier("personIdentifier", &domain.person_id_system, patient_id)
            .with_string("domain", domain.name.as_str());

        let request = self
            .request(Method::POST, POLICY_STATES_OPERATION)
            .header(header::CONTENT_TYPE, FHIR_JSON)
            .body(fhir::render(&body)?);

        let bundle: Bundle<Consent> = self.fetch(request).await?;
        let records: RegistryResult<Vec<_>> = bundle.resources().map(provision_record).collect();
        records
    }

    /// Template of the document a `Consent` was created from, e.g. `QuestionnaireResponse/42`.
    ///
    /// Returns an empty string when the response names no questionnaire.
    pub async fn source_reference_template(&self, reference: &str) -> RegistryResult<String> {
        let response: QuestionnaireResponse =
            self.fetch(self.request(Method::GET, reference)).await?;
        Ok(response.template_id().unwrap_or_default().to_owned())
    }

    /// Identifier of the first template of `template_type` defined for `domain_name`.
    ///
    /// Returns an empty string when the domain has no such template.
    pub async fn template(&self, domain_name: &str, template_type: &str) -> RegistryResult<String> {
        let request = self
            .request(Method::GET, "Questionnaire")
            .query(&[("domain", domain_name)]);
        let bundle: Bundle<Questionnaire> = self.fetch(request).await?;

        let template_id = bundle
            .resources()
            .find(|q| q.has_code(TEMPLATE_TYPE_SYSTEM, template_type))
            .and_then(Questionnaire::template_id)
            .unwrap_or_default()
            .to_owned();
        Ok(template_id)
    }
}

#[async_trait]
impl PolicyDirectoryClient for GicsClient {
    async fn list_domains(&self) -> Result<Vec<ResearchStudy>, DirectoryError> {
        Ok(self.domains().await?)
    }

    async fn get_provisions(
        &self,
        patient_id: &str,
        domain: &Domain,
    ) -> Result<Vec<ProvisionRecord>, DirectoryError> {
        Ok(self.policy_states(patient_id, domain).await?)
    }

    async fn resolve_withdrawal_template(
        &self,
        source_reference: &str,
    ) -> Result<String, DirectoryError> {
        Ok(self.source_reference_template(source_reference).await?)
    }

    async fn withdrawal_template(&self, domain_name: &str) -> Result<String, DirectoryError> {
        Ok(self.template(domain_name, WITHDRAWAL_TEMPLATE_TYPE).await?)
    }
}
