use std::sync::Arc;

use crate::classifier::Classifier;
use crate::config::{Mode, Settings};

/// Read-only state shared by every worker.
pub struct AppState {
    pub settings: Settings,
    /// `None` in mock mode, where no model is loaded.
    pub classifier: Option<Arc<dyn Classifier>>,
}

impl AppState {
    pub fn with_model(settings: Settings, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            settings,
            classifier: Some(classifier),
        }
    }

    pub fn mock(settings: Settings) -> Self {
        Self {
            settings: Settings {
                mode: Mode::Mock,
                ..settings
            },
            classifier: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }
}
