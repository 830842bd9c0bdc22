// Application state module
// Immutable per-process state shared by every connection task

use metrics_exporter_prometheus::PrometheusHandle;

use super::types::Config;
use crate::assets::AssetCache;
use crate::http::cache::CachePolicy;
use crate::routing::{Classifier, DomainRoute, DomainTable};

/// Application state
///
/// Built completely before the first listener is bound and shared through
/// an `Arc` afterwards. Nothing in here is mutated once requests flow.
pub struct AppState {
    pub config: Config,
    pub domains: DomainTable,
    pub assets: AssetCache,
    pub cache_policy: CachePolicy,
    /// Present when the Prometheus recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Config,
        routes: Vec<DomainRoute>,
        assets: AssetCache,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let domains = DomainTable::new(
            routes,
            &config.site.localhost_test_domain,
            &config.site.local_aliases,
        );
        let cache_policy = CachePolicy::new(&config.site.no_cache_extensions);

        Self {
            config,
            domains,
            assets,
            cache_policy,
            metrics,
        }
    }

    /// Resolution policy bound to this state's cache
    pub const fn classifier(&self) -> Classifier<'_> {
        Classifier::new(&self.assets, &self.cache_policy)
    }
}
