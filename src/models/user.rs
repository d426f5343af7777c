// src/models/user.rs

use serde::{Deserialize, Serialize};

/// Identity returned by `GET /user`. Keys the attempt ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,

    /// 'student' or 'teacher'.
    pub role: String,
}
