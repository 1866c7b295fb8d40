//! Backend registry and the process-wide shared instance.

use std::sync::Arc;

use shotgen_models::BackendKind;
use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::GenerationBackend;
use crate::config::BackendSettings;
use crate::error::{BackendError, BackendResult};
use crate::gemini::GeminiBackend;
use crate::vertex::VertexBackend;

static SHARED: OnceCell<Arc<BackendRegistry>> = OnceCell::const_new();

/// Configured backends plus the default used when a batch has no override.
///
/// Built once at startup; immutable afterwards.
pub struct BackendRegistry {
    default_kind: BackendKind,
    backends: Vec<Arc<dyn GenerationBackend>>,
}

impl BackendRegistry {
    /// Registry with a single backend, which becomes the default.
    pub fn single(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            default_kind: backend.kind(),
            backends: vec![backend],
        }
    }

    /// Add (or replace) the backend of the same kind. The default is unchanged.
    pub fn with_backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backends.retain(|b| b.kind() != backend.kind());
        self.backends.push(backend);
        self
    }

    /// Build every backend the settings have credentials for.
    pub async fn from_settings(settings: &BackendSettings) -> BackendResult<Self> {
        let default_kind = settings.default_kind()?;
        let mut backends: Vec<Arc<dyn GenerationBackend>> = Vec::new();

        if let Some(config) = &settings.gemini {
            backends.push(Arc::new(GeminiBackend::new(config.clone())?));
        }
        if let Some(config) = &settings.vertex {
            backends.push(Arc::new(VertexBackend::new(config.clone()).await?));
        }

        let registry = Self {
            default_kind,
            backends,
        };
        info!(
            default = %registry.default_kind,
            available = ?registry.available(),
            "Backend registry initialized"
        );
        Ok(registry)
    }

    pub fn default_kind(&self) -> BackendKind {
        self.default_kind
    }

    pub fn available(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn GenerationBackend>> {
        self.backends.iter().find(|b| b.kind() == kind).cloned()
    }

    /// Backend for a batch: the override when given, the default otherwise.
    pub fn resolve(
        &self,
        override_kind: Option<BackendKind>,
    ) -> BackendResult<Arc<dyn GenerationBackend>> {
        let kind = override_kind.unwrap_or(self.default_kind);
        self.get(kind).ok_or_else(|| {
            BackendError::configuration(format!("backend '{}' is not configured", kind))
        })
    }
}

/// Process-scoped registry, built from the environment on first use.
///
/// Later calls return the same instance; a failed initialization is not cached.
pub async fn shared_registry() -> BackendResult<Arc<BackendRegistry>> {
    SHARED
        .get_or_try_init(|| async {
            let settings = BackendSettings::from_env()?;
            BackendRegistry::from_settings(&settings).await.map(Arc::new)
        })
        .await
        .cloned()
}
