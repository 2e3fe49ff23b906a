use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::registry::ProviderRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reports provider availability from configuration alone; never touches the network.
#[derive(Clone)]
pub struct HealthReporter {
    registry: Arc<ProviderRegistry>,
}

impl HealthReporter {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn report(&self) -> BTreeMap<String, ProviderHealth> {
        self.registry
            .list_availability()
            .into_iter()
            .map(|(id, availability)| {
                (
                    id,
                    ProviderHealth {
                        available: availability.available,
                        error: availability.reason,
                    },
                )
            })
            .collect()
    }
}
