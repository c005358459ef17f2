use serde::{Deserialize, Serialize};

/// Body the ship API returns alongside a non-success status,
/// e.g. `{"error": "no such submarine"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerErrorBody {
    pub error: String,
}

impl ServerErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
