use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

/// A ticket record as delivered by the upstream claims API. Every field
/// except `id` can be absent in the feed; the aggregation routines that
/// require one surface its absence as a `MissingField` error instead of
/// reading through a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,
    #[serde(default)]
    pub close: bool,
}

impl Claim {
    pub fn is_published(&self) -> bool {
        self.publish_date.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.start_date.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.end_date.is_some()
    }

    pub fn publish_date(&self) -> AppResult<&str> {
        self.publish_date
            .as_deref()
            .ok_or_else(|| AppError::missing_field("publish_date"))
    }

    pub fn start_date(&self) -> AppResult<&str> {
        self.start_date
            .as_deref()
            .ok_or_else(|| AppError::missing_field("start_date"))
    }

    pub fn end_date(&self) -> AppResult<&str> {
        self.end_date
            .as_deref()
            .ok_or_else(|| AppError::missing_field("end_date"))
    }

    pub fn close_date(&self) -> AppResult<&str> {
        self.close_date
            .as_deref()
            .ok_or_else(|| AppError::missing_field("close_date"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Directory entry from the upstream API. Only the department matters to
/// the dashboard; unassigned users carry no department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub department: Option<i64>,
}

/// One fetch of the upstream API. Departments stay opaque; the dashboard
/// only consumes their count.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSnapshot {
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub users: Vec<ApiUser>,
    #[serde(default)]
    pub departments: Vec<JsonValue>,
}
