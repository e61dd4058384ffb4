//! The resolved configuration graph

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::id::{ComponentId, Kind};
use crate::settings::{AnySettings, ComponentSettings, SpecificSettings};

/// Resolved settings of one component category, ordered by id
pub type Components = BTreeMap<ComponentId, Box<dyn AnySettings>>;

/// Fully resolved and validated configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub extensions: Components,
    pub receivers: Components,
    pub processors: Components,
    pub exporters: Components,
    pub service: Service,
}

/// The `service` section: which extensions run and how pipelines are wired
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Service {
    /// Extensions to enable, in start order
    pub extensions: Vec<ComponentId>,
    /// Pipelines keyed by id; the id type is the pipeline data type
    pub pipelines: BTreeMap<ComponentId, Pipeline>,
}

/// Ordered composition of component ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pipeline {
    pub receivers: Vec<ComponentId>,
    pub processors: Vec<ComponentId>,
    pub exporters: Vec<ComponentId>,
}

impl Pipeline {
    /// Component ids referenced by this pipeline, by category
    pub fn references(&self) -> [(Kind, &[ComponentId]); 3] {
        [
            (Kind::Receiver, self.receivers.as_slice()),
            (Kind::Processor, self.processors.as_slice()),
            (Kind::Exporter, self.exporters.as_slice()),
        ]
    }
}

impl Config {
    /// Resolved components of a category; `None` for [`Kind::Pipeline`]
    pub fn components(&self, kind: Kind) -> Option<&Components> {
        match kind {
            Kind::Extension => Some(&self.extensions),
            Kind::Receiver => Some(&self.receivers),
            Kind::Processor => Some(&self.processors),
            Kind::Exporter => Some(&self.exporters),
            Kind::Pipeline => None,
        }
    }

    pub fn components_mut(&mut self, kind: Kind) -> Option<&mut Components> {
        match kind {
            Kind::Extension => Some(&mut self.extensions),
            Kind::Receiver => Some(&mut self.receivers),
            Kind::Processor => Some(&mut self.processors),
            Kind::Exporter => Some(&mut self.exporters),
            Kind::Pipeline => None,
        }
    }

    /// Resolved settings of a component
    pub fn get(&self, kind: Kind, id: &ComponentId) -> Option<&dyn AnySettings> {
        self.components(kind)?.get(id).map(|settings| settings.as_ref())
    }

    /// Resolved settings of a component, downcast to its concrete type
    pub fn typed<T: SpecificSettings>(
        &self,
        kind: Kind,
        id: &ComponentId,
    ) -> Option<&ComponentSettings<T>> {
        self.get(kind, id)?.downcast_ref::<T>()
    }

    pub fn contains(&self, kind: Kind, id: &ComponentId) -> bool {
        match kind {
            Kind::Pipeline => self.service.pipelines.contains_key(id),
            kind => self.get(kind, id).is_some(),
        }
    }

    /// Total number of resolved components across categories
    pub fn len(&self) -> usize {
        Kind::COMPONENTS
            .iter()
            .filter_map(|kind| self.components(*kind))
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.service.pipelines.is_empty()
    }
}
