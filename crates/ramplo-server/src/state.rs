use ramplo_core::advisory::Advisor;
use ramplo_core::catalog::SprintCatalog;
use ramplo_core::config::Config;
use ramplo_core::outreach::{template_selector, OutreachCatalog, TemplateSelector};
use ramplo_core::progress::ProgressTracker;
use ramplo_core::roadmap::{roadmap_selector, RoadmapSelector};
use ramplo_core::store::{SqliteStore, Store};
use std::path::Path;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub catalog: Arc<SprintCatalog>,
    pub outreach: Arc<OutreachCatalog>,
    pub roadmaps: Arc<RoadmapSelector>,
    pub templates: Arc<TemplateSelector>,
    pub tracker: Arc<ProgressTracker>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<SprintCatalog>,
        outreach: Arc<OutreachCatalog>,
        advisor: Arc<dyn Advisor>,
    ) -> Self {
        Self {
            roadmaps: Arc::new(roadmap_selector(catalog.clone(), advisor.clone())),
            templates: Arc::new(template_selector(outreach.clone(), advisor)),
            tracker: Arc::new(ProgressTracker::new(store.clone(), catalog.clone())),
            store,
            catalog,
            outreach,
        }
    }

    /// Open the configured database and catalogs under `root`.
    pub fn from_config(root: &Path, config: &Config, advisor: Arc<dyn Advisor>) -> ramplo_core::Result<Self> {
        let store = SqliteStore::open(&config.database_path(root))?;
        let catalog = config.load_catalog(root)?;
        let outreach = config.load_outreach_catalog(root)?;
        tracing::debug!(
            sprints = catalog.list().len(),
            templates = outreach.list().len(),
            "catalogs loaded"
        );
        Ok(Self::new(
            Arc::new(store),
            Arc::new(catalog),
            Arc::new(outreach),
            advisor,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramplo_core::advisory::DisabledAdvisor;

    #[test]
    fn from_config_opens_database_under_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::default();
        let state = AppState::from_config(dir.path(), &config, Arc::new(DisabledAdvisor)).unwrap();
        assert!(dir.path().join(".ramplo/ramplo.db").exists());
        assert_eq!(state.catalog.list().len(), 3);
        assert!(state.store.progress("nobody").unwrap().is_none());
    }
}
