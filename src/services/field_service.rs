// SPDX-License-Identifier: MIT

//! Mock scheduling, service-insight and knowledge backends

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;

use super::catalog::ServiceCatalog;
use super::Tool;

// --- Static schemas ---

static SCHEDULING_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "goal": {
                "type": "string",
                "description": "What the technician asked for"
            }
        }
    })
});

static SERVICE_INSIGHT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "work_order_id": {
                "type": "string",
                "description": "Work order to look up"
            }
        },
        "required": ["work_order_id"]
    })
});

static KNOWLEDGE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "product_id": {
                "type": "string",
                "description": "Product whose documentation is wanted"
            }
        },
        "required": ["product_id"]
    })
});

#[derive(Debug, Deserialize)]
struct WorkOrderArgs {
    work_order_id: String,
}

#[derive(Debug, Deserialize)]
struct ProductArgs {
    product_id: String,
}

/// Reports the work order scheduled for today
pub struct SchedulingService {
    catalog: Arc<ServiceCatalog>,
}

impl SchedulingService {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for SchedulingService {
    fn name(&self) -> &str {
        "scheduling_service"
    }

    fn description(&self) -> &str {
        "Find the work order scheduled today."
    }

    fn schema(&self) -> &Value {
        &SCHEDULING_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
        match self.catalog.scheduled() {
            Some(visit) => Ok(serde_json::to_value(visit)?),
            None => Ok(Value::Null),
        }
    }
}

/// Returns work order details including the product id
pub struct ServiceInsightService {
    catalog: Arc<ServiceCatalog>,
}

impl ServiceInsightService {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for ServiceInsightService {
    fn name(&self) -> &str {
        "service_insight_service"
    }

    fn description(&self) -> &str {
        "Get work order details including product_id and summary. Input must be a work_order_id."
    }

    fn schema(&self) -> &Value {
        &SERVICE_INSIGHT_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let args: WorkOrderArgs = serde_json::from_value(input)?;

        let Some(order) = self.catalog.work_order(&args.work_order_id) else {
            log::debug!("No work order '{}' in catalog", args.work_order_id);
            return Ok(Value::Null);
        };

        let mut result = serde_json::to_value(order)?;
        result["work_order_id"] = json!(args.work_order_id);
        Ok(result)
    }
}

/// Returns documentation and cleanup steps for a product
pub struct KnowledgeService {
    catalog: Arc<ServiceCatalog>,
}

impl KnowledgeService {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for KnowledgeService {
    fn name(&self) -> &str {
        "knowledge_service"
    }

    fn description(&self) -> &str {
        "Get documentation and cleanup steps for a product. Input must be a product_id."
    }

    fn schema(&self) -> &Value {
        &KNOWLEDGE_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let args: ProductArgs = serde_json::from_value(input)?;

        match self.catalog.docs_for(&args.product_id) {
            Some(docs) => Ok(serde_json::to_value(docs)?),
            None => {
                log::debug!("No documentation for product '{}'", args.product_id);
                Ok(Value::Null)
            }
        }
    }
}
