//! Shared holder for the active artifact set

use crate::error::Result;
use crate::models::artifacts::ArtifactSet;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// Holds the active [`ArtifactSet`].
///
/// Requests take a snapshot with [`ArtifactStore::current`] and run entirely
/// against it. Replacing the set swaps one pointer, so no request ever sees
/// schema, encoders and models from different loads.
pub struct ArtifactStore {
    current: RwLock<Arc<ArtifactSet>>,
}

impl ArtifactStore {
    pub fn new(set: ArtifactSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// Snapshot of the active set
    pub fn current(&self) -> Arc<ArtifactSet> {
        // the guarded value is a plain Arc, so a poisoned lock still holds a
        // complete set
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the active set, returning the previous one.
    pub fn swap(&self, set: ArtifactSet) -> Arc<ArtifactSet> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(set))
    }

    /// Load a new set with `load` and activate it on success.
    ///
    /// On failure the active set is left untouched.
    pub fn reload_with<F>(&self, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<ArtifactSet>,
    {
        match load() {
            Ok(set) => {
                let loaded_at = set.loaded_at;
                let previous = self.swap(set);
                info!(
                    previous_loaded_at = %previous.loaded_at,
                    loaded_at = %loaded_at,
                    "Artifact set reloaded"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Artifact reload failed, keeping the active set");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightError;
    use crate::models::artifacts::ArtifactParts;
    use crate::models::encoder::EncoderRegistry;
    use crate::models::predictor::Predictor;
    use crate::models::scaler::StandardScaler;
    use crate::models::schema::FeatureSchema;

    struct Constant(f64);

    impl Predictor for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _row: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![self.0])
        }
    }

    fn set(value: f64) -> ArtifactSet {
        let columns = vec!["Age".to_string()];
        ArtifactSet::assemble(ArtifactParts {
            schema: FeatureSchema::new(columns.clone()).unwrap(),
            encoders: EncoderRegistry::new(),
            scaler: StandardScaler::new(columns, vec![0.0], vec![1.0]).unwrap(),
            classifier: Box::new(Constant(value)),
            classification_targets: vec!["BurnoutRisk".into()],
            regressor: Box::new(Constant(value)),
            regression_targets: vec!["JobSatisfaction".into()],
            attrition: None,
        })
        .unwrap()
    }

    fn regressor_output(store: &ArtifactStore) -> f64 {
        store.current().regressor.predictor.predict(&[0.0]).unwrap()[0]
    }

    #[test]
    fn test_swap_replaces_whole_set() {
        let store = ArtifactStore::new(set(1.0));
        let snapshot = store.current();

        store.swap(set(2.0));

        assert_eq!(regressor_output(&store), 2.0);
        // an in-flight request keeps its snapshot
        assert_eq!(snapshot.regressor.predictor.predict(&[0.0]).unwrap()[0], 1.0);
    }

    #[test]
    fn test_failed_reload_keeps_active_set() {
        let store = ArtifactStore::new(set(1.0));

        let result = store.reload_with(|| Err(InsightError::artifact("scaler", "corrupt")));

        assert!(result.is_err());
        assert_eq!(regressor_output(&store), 1.0);

        store.reload_with(|| Ok(set(3.0))).unwrap();
        assert_eq!(regressor_output(&store), 3.0);
    }
}
