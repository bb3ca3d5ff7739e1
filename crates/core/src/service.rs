//! Per-request consent evaluation across all visible domains.

use crate::{
    filter_domains, ConsentError, ConsentResolver, ConsentResult, DomainCache, DomainStatus,
    PolicyDirectoryClient,
};
use std::sync::Arc;

/// Combines the domain snapshot, the registry and the resolver for one patient query.
#[derive(Clone)]
pub struct ConsentService {
    cache: Arc<DomainCache>,
    client: Arc<dyn PolicyDirectoryClient>,
    resolver: ConsentResolver,
}

impl ConsentService {
    pub fn new(cache: Arc<DomainCache>, client: Arc<dyn PolicyDirectoryClient>) -> Self {
        let resolver = ConsentResolver::new(client.clone());
        Self {
            cache,
            client,
            resolver,
        }
    }

    pub fn cache(&self) -> &Arc<DomainCache> {
        &self.cache
    }

    /// Status of every domain visible to `departments` for `patient_id`, in snapshot order.
    ///
    /// # Errors
    ///
    /// The first failing domain aborts the query:
    /// - [`ConsentError::DirectoryUnavailable`] if provisions cannot be fetched;
    /// - any error of [`ConsentResolver::resolve`].
    pub async fn domain_statuses(
        &self,
        patient_id: &str,
        departments: &[String],
    ) -> ConsentResult<Vec<DomainStatus>> {
        let snapshot = self.cache.snapshot();
        let domains = filter_domains(&snapshot, departments);

        let mut statuses = Vec::with_capacity(domains.len());
        for domain in &domains {
            let provisions = self
                .client
                .get_provisions(patient_id, domain)
                .await
                .map_err(|e| {
                    tracing::error!(domain = %domain, error = %e, "Failed to fetch provisions");
                    ConsentError::DirectoryUnavailable(e)
                })?;

            statuses.push(self.resolver.resolve(domain, &provisions).await?);
        }

        tracing::debug!(domains = statuses.len(), "Resolved consent status");
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{domain_study, no_expiry, provision, FakeDirectoryClient};
    use crate::ConsentStatus;
    use chrono::{Months, Utc};

    async fn service(client: FakeDirectoryClient) -> ConsentService {
        let client = Arc::new(client);
        let cache = Arc::new(DomainCache::new(client.clone()));
        assert!(cache.refresh_once().await);
        ConsentService::new(cache, client)
    }

    fn directory() -> FakeDirectoryClient {
        FakeDirectoryClient::default().with_domains(vec![
            domain_study("Test", "IDAT_Test", &[]),
            domain_study("Dep", "IDAT_Dep", &["dep"]),
        ])
    }

    #[tokio::test]
    async fn resolves_every_visible_domain() {
        let now = Utc::now();
        let expires = now.checked_add_months(Months::new(60)).expect("date");
        let service = service(
            directory()
                .with_provisions("Test", vec![provision("IDAT_Test", true, expires, now)])
                .with_provisions("Dep", vec![provision("IDAT_Dep", false, no_expiry(), now)]),
        )
        .await;

        let statuses = service
            .domain_statuses("123", &["dep".into()])
            .await
            .expect("statuses");

        let summary: Vec<_> = statuses
            .iter()
            .map(|s| (s.domain.as_str(), s.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Test", ConsentStatus::Accepted),
                ("Dep", ConsentStatus::Declined)
            ]
        );
    }

    #[tokio::test]
    async fn hides_department_domains_from_other_callers() {
        let service = service(directory()).await;

        let statuses = service.domain_statuses("123", &[]).await.expect("statuses");
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].domain, "Test");
        assert_eq!(statuses[0].status, ConsentStatus::NotAsked);
        assert!(statuses[0].ask_consent);
    }

    #[tokio::test]
    async fn registry_failure_is_directory_unavailable() {
        let service =
            service(directory().with_failing_provisions("Test", "502 Bad Gateway")).await;

        let err = service.domain_statuses("123", &[]).await.unwrap_err();
        assert!(matches!(err, ConsentError::DirectoryUnavailable(_)));
        assert!(err.to_string().contains("502 Bad Gateway"));
    }

    #[tokio::test]
    async fn missing_check_policy_propagates() {
        let now = Utc::now();
        let service = service(
            directory().with_provisions("Test", vec![provision("Other", true, now, now)]),
        )
        .await;

        let err = service.domain_statuses("123", &[]).await.unwrap_err();
        assert!(matches!(err, ConsentError::MissingCheckPolicy { .. }));
    }

    #[tokio::test]
    async fn empty_snapshot_yields_no_statuses() {
        let client = Arc::new(FakeDirectoryClient::default());
        let cache = Arc::new(DomainCache::new(client.clone()));
        let service = ConsentService::new(cache, client);

        let statuses = service.domain_statuses("123", &[]).await.expect("statuses");
        assert!(statuses.is_empty());
    }
}
