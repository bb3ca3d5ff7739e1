//! Consent status classification.
//!
//! [`ConsentResolver`] turns the provisions of one patient within one domain into a
//! [`DomainStatus`]. Each call recomputes from scratch; nothing is carried across calls.
//!
//! The only suspension point is the withdrawal lookup, which is attempted solely for a
//! denied authoritative provision that never expires, in a domain with a withdrawal
//! template. A failed lookup is logged and the provision stays `declined`.

use crate::status::is_no_expiry;
use crate::{
    ConsentError, ConsentResult, ConsentStatus, Domain, DomainStatus, Policy,
    PolicyDirectoryClient, ProvisionRecord,
};
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct ConsentResolver {
    client: Arc<dyn PolicyDirectoryClient>,
}

impl ConsentResolver {
    pub fn new(client: Arc<dyn PolicyDirectoryClient>) -> Self {
        Self { client }
    }

    /// Resolve the consent status of `domain` at the current time.
    ///
    /// # Errors
    ///
    /// See [`ConsentResolver::resolve_at`].
    pub async fn resolve(
        &self,
        domain: &Domain,
        provisions: &[ProvisionRecord],
    ) -> ConsentResult<DomainStatus> {
        self.resolve_at(domain, provisions, Utc::now()).await
    }

    /// Resolve the consent status of `domain` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`ConsentError::MalformedProvision`] if a provision has no coding, or the
    ///   authoritative provision has no period end;
    /// - [`ConsentError::MissingCheckPolicy`] if `provisions` is non-empty but none carries
    ///   the domain's check policy code.
    pub async fn resolve_at(
        &self,
        domain: &Domain,
        provisions: &[ProvisionRecord],
        now: DateTime<Utc>,
    ) -> ConsentResult<DomainStatus> {
        let mut result = DomainStatus {
            domain: domain.name.clone(),
            description: domain.description.clone(),
            status: ConsentStatus::NotAsked,
            last_updated: None,
            expires: None,
            ask_consent: true,
            policies: Vec::with_capacity(provisions.len()),
        };

        if provisions.is_empty() {
            return Ok(result);
        }

        let ask_threshold = now.checked_add_months(Months::new(12)).unwrap_or(now);
        let mut check_policy_found = false;

        for provision in provisions {
            let policy = policy_of(provision)?;

            if let Some(updated) = provision.last_updated {
                if result.last_updated.map_or(true, |current| updated > current) {
                    result.last_updated = Some(updated);
                }
            }

            if policy.code == domain.check_policy_code {
                check_policy_found = true;

                let expires = provision.period_end.ok_or_else(|| {
                    ConsentError::MalformedProvision(format!(
                        "provision '{}' has no period end",
                        policy.code
                    ))
                })?;
                result.expires = Some(expires);
                result.ask_consent = expires < ask_threshold;

                result.status = if policy.permit {
                    if expires < now {
                        ConsentStatus::Expired
                    } else {
                        ConsentStatus::Accepted
                    }
                } else if is_no_expiry(&expires) && self.is_withdrawal(domain, provision).await {
                    ConsentStatus::Withdrawn
                } else {
                    ConsentStatus::Declined
                };
            }

            result.policies.push(policy);
        }

        if !check_policy_found {
            tracing::error!(
                domain = %domain.name,
                check_policy = %domain.check_policy_code,
                "Unable to determine consent status. Configured policy not found"
            );
            return Err(ConsentError::MissingCheckPolicy {
                domain: domain.name.clone(),
                check_policy: domain.check_policy_code.clone(),
            });
        }

        Ok(result)
    }

    /// Whether the document behind a denied provision is the domain's withdrawal template.
    async fn is_withdrawal(&self, domain: &Domain, provision: &ProvisionRecord) -> bool {
        let Some(template) = domain
            .withdrawal_template_ref
            .as_deref()
            .filter(|t| !t.is_empty())
        else {
            return false;
        };
        let Some(reference) = provision.source_reference.as_deref() else {
            return false;
        };

        match self.client.resolve_withdrawal_template(reference).await {
            Ok(resolved) => {
                let resolved = resolved.trim();
                !resolved.is_empty() && resolved == template
            }
            Err(e) => {
                tracing::warn!(
                    domain = %domain.name,
                    source_reference = reference,
                    error = %e,
                    "Withdrawal template lookup failed, treating provision as declined"
                );
                false
            }
        }
    }
}

fn policy_of(provision: &ProvisionRecord) -> ConsentResult<Policy> {
    let coding = provision
        .coding
        .as_ref()
        .filter(|c| !c.code.trim().is_empty())
        .ok_or_else(|| ConsentError::MalformedProvision("missing policy coding".into()))?;

    let name = coding
        .display
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(&coding.code)
        .to_owned();

    Ok(Policy {
        name,
        permit: provision.permit,
        code: coding.code.clone(),
    })
}
