// ABOUTME: Serde model of the proxy routing document.
// ABOUTME: Routers map host rules to services; weighted services split traffic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::ServiceName;

/// The declarative routing configuration the proxy reconciles against.
///
/// Exactly one router handles a given public hostname at any time. The
/// orchestrator only ever replaces the whole document, never edits it in
/// place, so the proxy observes either the old or the new configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDocument {
    pub routers: BTreeMap<String, Router>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, WeightedService>,
}

/// A named router: host rule plus the service reference handling its traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub rule: String,
    pub service: String,
    #[serde(
        default,
        rename = "entryPoints",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entry_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedService {
    pub weighted: Weighted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weighted {
    pub services: Vec<ServiceWeight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWeight {
    pub name: String,
    pub weight: u32,
}

impl RouteDocument {
    /// Find the router currently carrying traffic for `service`.
    ///
    /// The orchestrator adapts to whatever router is already live instead of
    /// assuming a fixed name: a router matches if its service reference is
    /// `service` directly, or a weighted service that includes `service`.
    /// A document with a single router matches unconditionally.
    pub fn discover_router(&self, service: &ServiceName) -> Option<&str> {
        for (name, router) in &self.routers {
            if router.service == service.as_str() {
                return Some(name);
            }
            if let Some(weighted) = self.services.get(&router.service)
                && weighted
                    .weighted
                    .services
                    .iter()
                    .any(|w| w.name == service.as_str())
            {
                return Some(name);
            }
        }
        if self.routers.len() == 1 {
            return self.routers.keys().next().map(String::as_str);
        }
        None
    }

    /// Derive the document for the canary stage: the named router points at a
    /// weighted service splitting traffic between the old and new instances.
    pub fn with_canary_split(
        &self,
        router_name: &str,
        old: &ServiceName,
        new: &ServiceName,
        old_weight: u32,
        new_weight: u32,
    ) -> RouteDocument {
        let mut doc = self.clone();
        let split_name = format!("{router_name}-canary");
        doc.services.insert(
            split_name.clone(),
            WeightedService {
                weighted: Weighted {
                    services: vec![
                        ServiceWeight {
                            name: old.to_string(),
                            weight: old_weight,
                        },
                        ServiceWeight {
                            name: new.to_string(),
                            weight: new_weight,
                        },
                    ],
                },
            },
        );
        if let Some(router) = doc.routers.get_mut(router_name) {
            router.service = split_name;
        }
        doc
    }

    /// Derive the document for full cutover: the named router points straight
    /// at the new service and the canary split is dropped.
    pub fn with_cutover(&self, router_name: &str, new: &ServiceName) -> RouteDocument {
        let mut doc = self.clone();
        doc.services.remove(&format!("{router_name}-canary"));
        if let Some(router) = doc.routers.get_mut(router_name) {
            router.service = new.to_string();
        }
        doc
    }
}
