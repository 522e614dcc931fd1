use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub car_type: String,
    pub car_model: String,
    pub plate_number: String,
    pub rating: f64,
    pub is_online: bool,
}
