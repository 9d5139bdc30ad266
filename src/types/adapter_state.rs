//! Lifecycle of an adapter: nothing, then fetched data, then a GLM table.

use crate::types::met_data::MetData;

/// What an adapter currently holds.
///
/// `G` is the converted output: one [`crate::GlmTable`] for most providers, one per
/// model for the climate adapter. Fetching always moves back to `Fetched`, dropping
/// any table derived from the previous fetch.
#[derive(Debug, Clone, Default)]
pub enum AdapterState<G> {
    #[default]
    Uninitialized,
    Fetched(MetData),
    Converted { met_data: MetData, glm: G },
}

impl<G> AdapterState<G> {
    pub fn met_data(&self) -> Option<&MetData> {
        match self {
            AdapterState::Uninitialized => None,
            AdapterState::Fetched(met_data) => Some(met_data),
            AdapterState::Converted { met_data, .. } => Some(met_data),
        }
    }

    pub fn glm(&self) -> Option<&G> {
        match self {
            AdapterState::Converted { glm, .. } => Some(glm),
            _ => None,
        }
    }

    pub(crate) fn set_fetched(&mut self, met_data: MetData) {
        *self = AdapterState::Fetched(met_data);
    }

    /// Stores `glm` next to the fetched data. Returns `false` (and stores nothing)
    /// when nothing has been fetched yet.
    pub(crate) fn set_converted(&mut self, glm: G) -> bool {
        match std::mem::take(self) {
            AdapterState::Uninitialized => false,
            AdapterState::Fetched(met_data) | AdapterState::Converted { met_data, .. } => {
                *self = AdapterState::Converted { met_data, glm };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::frame::DataFrame;
    use serde_json::Map;

    fn met() -> MetData {
        MetData::new(Map::new(), DataFrame::empty())
    }

    #[test]
    fn test_transitions() {
        let mut state: AdapterState<u8> = AdapterState::default();
        assert!(state.met_data().is_none());
        assert!(!state.set_converted(1));
        assert!(matches!(state, AdapterState::Uninitialized));

        state.set_fetched(met());
        assert!(state.met_data().is_some());
        assert!(state.glm().is_none());

        assert!(state.set_converted(1));
        assert_eq!(state.glm(), Some(&1));
        assert!(state.set_converted(2));
        assert_eq!(state.glm(), Some(&2));

        state.set_fetched(met());
        assert!(state.glm().is_none());
    }
}
