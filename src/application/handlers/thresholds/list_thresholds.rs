//! ListThresholdsHandler - Query handler for the admin threshold view.

use std::sync::Arc;

use crate::application::error::ReflectionError;
use crate::domain::reflection::{CompletionEvaluator, ThresholdProfile};
use crate::ports::ThresholdStore;

/// A stored profile and whether the evaluator currently honours it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdView {
    pub profile: ThresholdProfile,
    pub active: bool,
}

/// Handler for listing threshold profiles.
pub struct ListThresholdsHandler {
    thresholds: Arc<dyn ThresholdStore>,
    activation_floor: f64,
}

impl ListThresholdsHandler {
    pub fn new(thresholds: Arc<dyn ThresholdStore>, evaluator: &CompletionEvaluator) -> Self {
        Self {
            thresholds,
            activation_floor: evaluator.activation_floor(),
        }
    }

    /// Profiles in phase order. Phases without feedback are absent.
    pub async fn handle(&self) -> Result<Vec<ThresholdView>, ReflectionError> {
        let mut profiles = self.thresholds.list().await?;
        profiles.sort_by_key(|p| p.phase_id);

        Ok(profiles.into_iter().map(|p| self.view(p)).collect())
    }

    pub fn view(&self, profile: ThresholdProfile) -> ThresholdView {
        ThresholdView {
            active: profile.is_active(self.activation_floor),
            profile,
        }
    }
}
