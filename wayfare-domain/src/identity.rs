use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal behind a state-machine operation.
///
/// Threaded explicitly through every call that carries an authorization
/// guard; the core never reads identity from ambient context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: Uuid,
    pub display_name: String,
}

impl Caller {
    pub fn new(user_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
