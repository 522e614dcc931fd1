use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub from: String,
    pub to: String,
    pub distance: String,
    pub duration: String,
    /// Fare per car type id.
    pub pricing: BTreeMap<String, f64>,
}

impl Route {
    /// Fare for `car_type` on this route, `None` when the route does not
    /// serve that car type.
    pub fn price_for(&self, car_type: &str) -> Option<f64> {
        self.pricing.get(car_type).copied()
    }
}
