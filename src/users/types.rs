use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local record of an externally authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Stable subject issued by the identity provider.
    pub external_id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
