// Administration models: users, schedules and platform statistics
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Short public id shown next to the account
    #[serde(rename = "userId8", default)]
    pub short_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUser {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("'{0}' is not an email address")]
    InvalidEmail(String),
}

/// Body of a create-user request, forwarded to the backend as is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

impl NewUser {
    /// Trims name and email, then checks every field is filled in
    pub fn validate(mut self) -> Result<Self, InvalidUser> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();

        if self.name.is_empty() {
            return Err(InvalidUser::MissingField("name"));
        }
        if self.email.is_empty() {
            return Err(InvalidUser::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(InvalidUser::MissingField("password"));
        }

        let well_formed = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(InvalidUser::InvalidEmail(self.email));
        }
        Ok(self)
    }
}

/// Timed actuator job attached to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_id: String,
    /// Cron expression or time of day
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub active: bool,
}

/// Platform-wide counters for the dashboard landing page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub users: u64,
    #[serde(default)]
    pub devices: u64,
    #[serde(default)]
    pub telemetry_records: u64,
    #[serde(default)]
    pub schedules: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub name: &'static str,
    pub value: u64,
    pub palette: &'static str,
}

impl Stats {
    pub fn cards(&self) -> Vec<StatCard> {
        vec![
            StatCard { name: "Total Users", value: self.users, palette: "blue" },
            StatCard { name: "Total Devices", value: self.devices, palette: "green" },
            StatCard {
                name: "Telemetry Records",
                value: self.telemetry_records,
                palette: "yellow",
            },
            StatCard { name: "Active Schedules", value: self.schedules, palette: "purple" },
        ]
    }
}
