use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. `sub` is the only identity field the session guard reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: i64,    // issued at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // only present when a TTL is configured
    pub iss: String,
    pub aud: String,
}
