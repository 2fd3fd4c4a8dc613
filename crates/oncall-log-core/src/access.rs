//! Roles and what each role may do.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Something a signed-in pharmacist may be allowed to do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateLog,
    ViewOwnLogs,
    ViewSiteLogs,
    ViewAllLogs,
    ArchiveLogs,
    GenerateReports,
    ViewDashboard,
}

/// Pharmacist role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
}

const USER_CAPABILITIES: &[Capability] = &[Capability::CreateLog, Capability::ViewOwnLogs];

const MANAGER_CAPABILITIES: &[Capability] = &[
    Capability::CreateLog,
    Capability::ViewOwnLogs,
    Capability::ViewSiteLogs,
    Capability::ViewAllLogs,
    Capability::ArchiveLogs,
    Capability::GenerateReports,
    Capability::ViewDashboard,
];

impl Role {
    /// Everything this role may do.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => USER_CAPABILITIES,
            Role::Manager => MANAGER_CAPABILITIES,
        }
    }

    /// Check a single capability.
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
        }
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
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "manager" => Ok(Role::Manager),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The pharmacist recording a log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub role: Role,
}

impl Author {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}
