use crate::auth::AccessPolicy;
use crate::config::GradingScheme;
use crate::session::Session;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub scheme: GradingScheme,
    pub policy: Box<dyn AccessPolicy>,
    pub sessions: HashMap<String, Session>,
}

impl AppState {
    pub fn new(scheme: GradingScheme) -> Self {
        let policy = crate::auth::policy_for(&scheme);
        Self {
            scheme,
            policy,
            sessions: HashMap::new(),
        }
    }
}
