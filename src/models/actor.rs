use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Admin,
    Agent,
    Driver,
    Customer,
    Csr,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Guest => "guest",
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Driver => "driver",
            Role::Customer => "customer",
            Role::Csr => "csr",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "driver" => Ok(Role::Driver),
            "customer" => Ok(Role::Customer),
            "csr" => Ok(Role::Csr),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Identity of whoever is invoking an engine operation, as handed over by the
/// identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn guest() -> Self {
        Self {
            id: "guest".to_string(),
            name: "Guest".to_string(),
            email: String::new(),
            role: Role::Guest,
        }
    }

    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}
