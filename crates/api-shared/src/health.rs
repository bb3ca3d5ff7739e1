use consent_core::DomainCache;
use serde::Serialize;
use utoipa::ToSchema;

/// Health report of the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    /// Number of domains currently served.
    pub domains: usize,
}

/// Health check shared by the HTTP surfaces.
///
/// The service is healthy when the last refresh of the domain directory succeeded.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Report the health of `cache`.
    ///
    /// # Returns
    /// A `HealthRes` with `ok` set to the outcome of the most recent directory refresh.
    pub fn check_health(cache: &DomainCache) -> HealthRes {
        let ok = cache.healthy();
        HealthRes {
            ok,
            message: if ok {
                "consented is alive".into()
            } else {
                "consent registry unavailable, domain list may be out of date".into()
            },
            domains: cache.snapshot().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_core::testing::{domain_study, FakeDirectoryClient};
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_cache_health() {
        let client = Arc::new(
            FakeDirectoryClient::default()
                .with_domains(vec![domain_study("Foo", "MDAT_erheben", &[])]),
        );
        let cache = DomainCache::new(client.clone());

        let before = HealthService::check_health(&cache);
        assert!(!before.ok);
        assert_eq!(before.domains, 0);

        assert!(cache.refresh_once().await);
        let after = HealthService::check_health(&cache);
        assert!(after.ok);
        assert_eq!(after.domains, 1);

        client.fail_domains("down");
        cache.refresh_once().await;
        let degraded = HealthService::check_health(&cache);
        assert!(!degraded.ok);
        assert_eq!(degraded.domains, 1);
        assert_eq!(
            serde_json::to_value(&degraded).expect("serialize")["ok"],
            false
        );
    }
}
