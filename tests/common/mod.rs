#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use canvasflow::{LlmError, MemoryStore, Pipeline, SchemaPolicy, TextModel, Warehouse};
use serde_json::{Value, json};

/// Replies from a fixed queue and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: LlmError) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(err)])),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub fn warehouse() -> Warehouse {
    Warehouse::new(Arc::new(MemoryStore::new()), "test_ds")
}

pub fn pipeline(model: Arc<ScriptedModel>) -> Pipeline {
    Pipeline::new(model, warehouse().with_schema_policy(SchemaPolicy::Widen))
}

pub fn strict_pipeline(model: Arc<ScriptedModel>) -> Pipeline {
    Pipeline::new(model, warehouse())
}

pub fn canvas_reply() -> Value {
    json!({
        "key-partners": ["Pharmacies", "Drone makers", "Insurers"],
        "key-activities": ["Routing", "Fleet upkeep", "Compliance"],
        "key-resources": ["Drones", "Flight software", "Pilots"],
        "value-propositions": ["Same-hour delivery", "Cold chain", "Tracking"],
        "customer-relationships": ["Self-service", "Support line", "Account managers"],
        "channels": ["Pharmacy apps", "Web", "Partners"],
        "customer-segments": ["Rural patients", "Clinics", "Elderly"],
        "cost-structure": ["Hardware", "Insurance", "Staff"],
        "revenue-streams": ["Per-delivery fee", "Subscriptions", "B2B contracts"]
    })
}

pub fn hypotheses_reply() -> Value {
    json!({
        "total_hypotheses": 0,
        "ai_suggested": 0,
        "human_added": 0,
        "risk_weight_total": "90%",
        "hypotheses": [
            {"category": "Customer Segments", "hypothesis": "Rural patients pay for speed", "risk_weight": 30, "type": "AI Suggested", "ai_doable": "Yes"},
            {"category": "Channels", "hypothesis": "Pharmacies list us in-app", "risk_weight": 25, "type": "AI Suggested", "ai_doable": "Yes"},
            {"category": "Revenue Streams", "hypothesis": "Clinics sign yearly contracts", "risk_weight": 25, "type": "AI Suggested", "ai_doable": "No"},
            {"category": "Key Partners", "hypothesis": "Insurers cover flights", "risk_weight": 20, "type": "Human Added", "ai_doable": "Yes"}
        ]
    })
}

pub fn experiments_reply() -> Value {
    json!({
        "experiment_count": 9,
        "experiments": [
            {
                "hypothesis": "Rural patients pay for speed",
                "experiment_type": "Validation",
                "ai_confidence": 80,
                "experiment_name": "Pre-sale landing page",
                "testing_statement": "Patients pre-pay for one delivery",
                "measurement": "Conversion rate",
                "description": "Run a landing page with a pre-sale button.",
                "cost_range": "$200",
                "runtime": "2 weeks",
                "success_metric": "5% conversion",
                "priority": "High",
                "ai_doable": "Yes"
            }
        ]
    })
}

pub fn fenced(value: &Value) -> String {
    format!("```json\n{}\n```", serde_json::to_string_pretty(value).unwrap())
}

pub fn bmc_request(project_id: u64) -> Value {
    json!({
        "project_id": project_id,
        "project_name": "SkyMeds",
        "project_description": "Drone delivery for rural pharmacies",
        "sector": "Health",
        "funding_stage": "Seed",
        "team_size": 4,
        "project_document": "pitch deck text",
        "cost_structure": "hardware heavy",
        "revenue_potential": "per-delivery fees"
    })
}
