use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capacity: u32,
    pub features: Vec<String>,
    pub icon: String,
}
