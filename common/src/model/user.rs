use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::requests::AccountDetails;

pub const DEFAULT_TIMEZONE: &str = "Africa/Lagos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Student,
    Parent,
    Educator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Educator => "educator",
            Role::Admin => "admin",
        }
    }

    /// Roles allowed into the student portal.
    pub fn has_portal(&self) -> bool {
        matches!(self, Role::Student | Role::Parent | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "educator" => Ok(Role::Educator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub timezone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub avatar_url: Option<String>,
    pub loyalty_points: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email_lesson_reminders: bool,
    pub email_progress_reports: bool,
    pub email_promotions: bool,
    pub push_lesson_reminders: bool,
    pub push_messages: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_lesson_reminders: true,
            email_progress_reports: true,
            email_promotions: false,
            push_lesson_reminders: true,
            push_messages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(flatten)]
    pub user: User,
    pub preferences: NotificationPreferences,
    /// Account type and the details given at registration.
    pub account: AccountDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

/// Returned by register and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
