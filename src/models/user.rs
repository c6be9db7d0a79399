use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::preferences::DriverPreferences;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Trucker,
    Company,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub role: Role,
    pub preferences: Option<DriverPreferences>,
    pub current_route_id: Option<Uuid>,
}

impl UserProfile {
    pub fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            preferences: None,
            current_route_id: None,
        }
    }
}
