// SPDX-License-Identifier: MIT

//! In-memory field-service records
//!
//! The catalog is plain data. [`ServiceCatalog::default`] seeds the demo
//! records; [`ServiceCatalog::load`] reads a replacement from YAML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::engine::error::DispatchError;

/// The visit the scheduling backend reports for today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledVisit {
    pub work_order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl ScheduledVisit {
    /// A visit that only names its work order
    pub fn new(work_order_id: impl Into<String>) -> Self {
        Self {
            work_order_id: work_order_id.into(),
            date: None,
            technician: None,
            start_time: None,
            site: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkOrder {
    pub product_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Earlier service notes, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Documentation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_steps: Vec<String>,
}

/// Records backing the mock scheduling, insight and knowledge services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub scheduled: Option<ScheduledVisit>,
    /// Visit details keyed by work order id, picked up by `with_scheduled`
    #[serde(default)]
    pub visits: HashMap<String, ScheduledVisit>,
    /// Keyed by work order id
    #[serde(default)]
    pub work_orders: HashMap<String, WorkOrder>,
    /// Keyed by product id
    #[serde(default)]
    pub documentation: HashMap<String, Documentation>,
}

impl ServiceCatalog {
    /// Catalog with no records
    pub fn empty() -> Self {
        Self {
            scheduled: None,
            visits: HashMap::new(),
            work_orders: HashMap::new(),
            documentation: HashMap::new(),
        }
    }

    /// Load a catalog from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DispatchError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Replace today's scheduled work order, carrying over any known visit details
    pub fn with_scheduled(mut self, work_order_id: impl Into<String>) -> Self {
        let work_order_id = work_order_id.into();
        let visit = self
            .visits
            .get(&work_order_id)
            .cloned()
            .unwrap_or_else(|| ScheduledVisit::new(work_order_id));
        self.scheduled = Some(visit);
        self
    }

    /// Record who visits a work order, when and where
    pub fn with_visit(mut self, visit: ScheduledVisit) -> Self {
        self.visits.insert(visit.work_order_id.clone(), visit);
        self
    }

    pub fn with_work_order(mut self, work_order_id: impl Into<String>, order: WorkOrder) -> Self {
        self.work_orders.insert(work_order_id.into(), order);
        self
    }

    pub fn with_documentation(mut self, product_id: impl Into<String>, docs: Documentation) -> Self {
        self.documentation.insert(product_id.into(), docs);
        self
    }

    pub fn scheduled(&self) -> Option<&ScheduledVisit> {
        self.scheduled.as_ref()
    }

    pub fn work_order(&self, work_order_id: &str) -> Option<&WorkOrder> {
        self.work_orders.get(work_order_id)
    }

    pub fn docs_for(&self, product_id: &str) -> Option<&Documentation> {
        self.documentation.get(product_id)
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::empty()
            .with_scheduled("WO-123")
            .with_work_order(
                "WO-123",
                WorkOrder {
                    product_id: "AC-987".to_string(),
                    description: "Repair AC unit on rooftop".to_string(),
                    work_order_type: None,
                    asset: None,
                    history: Vec::new(),
                },
            )
            .with_work_order(
                "WO-100245",
                WorkOrder {
                    product_id: "PROD-77881".to_string(),
                    description: "Intermittent belt slipping and debris buildup near rollers"
                        .to_string(),
                    work_order_type: Some("Critical".to_string()),
                    asset: Some("Packaging Line Conveyor A7".to_string()),
                    history: vec![
                        "2026-01-15: Belt tension adjusted".to_string(),
                        "2026-02-10: Debris cleanup near rollers".to_string(),
                    ],
                },
            )
            .with_visit(ScheduledVisit {
                date: Some("2026-02-20".to_string()),
                technician: Some("Tech-01".to_string()),
                start_time: Some("10:00 AM".to_string()),
                site: Some("Acme Plant - San Jose".to_string()),
                ..ScheduledVisit::new("WO-100245")
            })
            .with_documentation(
                "AC-987",
                Documentation {
                    title: "AC-987 Installation & Maintenance Manual".to_string(),
                    cleanup_steps: Vec::new(),
                },
            )
            .with_documentation(
                "PROD-77881",
                Documentation {
                    title: "Conveyor Cleanup & Basic Care (Quick Guide)".to_string(),
                    cleanup_steps: [
                        "Power down the machine and follow lockout/tagout",
                        "Inspect belt + roller areas for debris buildup",
                        "Use non-abrasive cloth + approved cleaner",
                        "Clear debris near drive + idler rollers with a soft brush",
                        "Check belt tension + alignment after cleaning",
                        "Restart and verify smooth motion (no slipping)",
                    ]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                },
            )
    }
}
