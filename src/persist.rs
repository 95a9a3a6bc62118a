//! Saving and restoring the viewport through a [`KeyValueStore`].
//!
//! Both directions are best-effort: failures are logged and never reach
//! the caller.

use tracing::{debug, warn};

use crate::model::{SavedViewport, Viewport, clamp_unit};
use crate::storage::KeyValueStore;

/// Store key for the saved viewport.
pub const VIEWPORT_KEY: &str = "journey.timeline.viewport";

/// Writes scale and position. Errors are logged and dropped.
pub fn save_viewport(store: &dyn KeyValueStore, viewport: &Viewport) {
    let saved = SavedViewport {
        scale: viewport.scale,
        position: viewport.position,
    };
    let json = match serde_json::to_string(&saved) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize viewport");
            return;
        }
    };
    if let Err(e) = store.set(VIEWPORT_KEY, &json) {
        warn!(error = %e, "failed to save viewport");
    }
}

/// Reads the saved viewport, falling back to the default on any failure.
pub fn restore_viewport(store: &dyn KeyValueStore) -> SavedViewport {
    restore_viewport_or(store, SavedViewport::default())
}

/// Reads the saved viewport, falling back to `fallback` on any failure.
pub fn restore_viewport_or(store: &dyn KeyValueStore, fallback: SavedViewport) -> SavedViewport {
    let json = match store.get(VIEWPORT_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return fallback,
        Err(e) => {
            warn!(error = %e, "failed to read saved viewport, using default");
            return fallback;
        }
    };

    match serde_json::from_str::<SavedViewport>(&json) {
        Ok(saved) => {
            debug!(scale = %saved.scale, position = saved.position, "viewport restored");
            let position = if saved.scale.is_full() {
                0.0
            } else {
                clamp_unit(saved.position)
            };
            SavedViewport {
                scale: saved.scale,
                position,
            }
        }
        Err(e) => {
            warn!(error = %e, "saved viewport is corrupt, using default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Scale;
    use crate::storage::{MemoryStore, StorageError};

    /// A store whose every call fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> crate::storage::Result<Option<String>> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }

        fn set(&self, _key: &str, _value: &str) -> crate::storage::Result<()> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }
    }

    #[test]
    fn save_then_restore() {
        let store = MemoryStore::new();
        let viewport = Viewport::new(Scale::SixHours, 0.75);

        save_viewport(&store, &viewport);
        let restored = restore_viewport(&store);

        assert_eq!(restored.scale, Scale::SixHours);
        assert!((restored.position - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn nothing_saved_yields_default() {
        let restored = restore_viewport(&MemoryStore::new());
        assert_eq!(restored, SavedViewport::default());
    }

    #[test]
    fn malformed_json_yields_default() {
        let store = MemoryStore::with(VIEWPORT_KEY, "{not json");
        let restored = restore_viewport(&store);

        assert_eq!(restored.scale, Scale::Day);
        assert!(restored.position.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_scale_yields_default() {
        let store = MemoryStore::with(VIEWPORT_KEY, r#"{"scale":"2h","position":0.5}"#);
        assert_eq!(restore_viewport(&store), SavedViewport::default());
    }

    #[test]
    fn out_of_range_position_is_clamped() {
        let store = MemoryStore::with(VIEWPORT_KEY, r#"{"scale":"1h","position":7.5}"#);
        let restored = restore_viewport(&store);

        assert_eq!(restored.scale, Scale::Hour);
        assert!((restored.position - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_used_only_when_nothing_valid_is_saved() {
        let fallback = SavedViewport {
            scale: Scale::Week,
            position: 0.0,
        };
        assert_eq!(restore_viewport_or(&MemoryStore::new(), fallback), fallback);

        let store = MemoryStore::with(VIEWPORT_KEY, r#"{"scale":"1h","position":0.5}"#);
        assert_eq!(restore_viewport_or(&store, fallback).scale, Scale::Hour);
    }

    #[test]
    fn full_scale_restores_at_zero() {
        let store = MemoryStore::with(VIEWPORT_KEY, r#"{"scale":"full","position":0.9}"#);
        let restored = restore_viewport(&store);

        assert_eq!(restored.scale, Scale::Full);
        assert!(restored.position.abs() < f64::EPSILON);
    }

    #[test]
    fn broken_store_never_panics() {
        save_viewport(&BrokenStore, &Viewport::default());
        assert_eq!(restore_viewport(&BrokenStore), SavedViewport::default());
    }
}
