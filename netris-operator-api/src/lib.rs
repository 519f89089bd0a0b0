pub mod allocations;
pub mod bgps;
pub mod client;
pub mod error;
pub mod inventory;
pub mod l4lbs;
pub mod links;
pub mod nats;
pub mod nos;
pub mod ports;
pub mod profiles;
pub mod response;
pub mod server_clusters;
pub mod sites;
pub mod subnets;
pub mod templates;
pub mod tenants;
pub mod vnets;
pub mod vpcs;

pub use client::Client;
pub use error::ApiError;
pub use response::{AddReply, ApiResponse};

use serde::{Deserialize, Serialize};

/// Reference to another controller object, sent and received as `{id, name}`.
/// Most write payloads only need the `id` part filled in; whichever half is
/// unset stays off the wire.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdName {
    #[serde(default, skip_serializing_if = "id_unset")]
    pub id: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

fn id_unset(id: &u32) -> bool {
    *id == 0
}

impl IdName {
    pub fn id(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
        }
    }

    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Fields the controller accepts either as a number or as the literal
/// string `"auto"` (switch/softgate ASNs and similar).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum NumberOrAuto {
    Number(u32),
    Auto(String),
}

impl NumberOrAuto {
    /// Zero means "let the controller pick".
    pub fn from_u32(value: u32) -> Self {
        if value == 0 {
            NumberOrAuto::Auto("auto".to_owned())
        } else {
            NumberOrAuto::Number(value)
        }
    }
}

impl Default for NumberOrAuto {
    fn default() -> Self {
        NumberOrAuto::Auto("auto".to_owned())
    }
}

/// Empty strings become `"auto"` on the wire (main/management addresses).
pub fn auto_if_empty(value: &str) -> String {
    if value.is_empty() {
        "auto".to_owned()
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_or_auto_serializes_auto_as_string() {
        let auto = serde_json::to_string(&NumberOrAuto::from_u32(0)).unwrap();
        let fixed = serde_json::to_string(&NumberOrAuto::from_u32(65000)).unwrap();

        assert_eq!(auto, "\"auto\"");
        assert_eq!(fixed, "65000");
    }

    #[test]
    fn auto_if_empty_passes_addresses_through() {
        assert_eq!(auto_if_empty(""), "auto");
        assert_eq!(auto_if_empty("198.51.100.7"), "198.51.100.7");
    }

    #[test]
    fn unset_reference_halves_stay_off_the_wire() {
        let by_id = serde_json::to_string(&IdName::id(7)).unwrap();
        let by_name = serde_json::to_string(&IdName::named(0, "admin")).unwrap();

        assert_eq!(by_id, r#"{"id":7}"#);
        assert_eq!(by_name, r#"{"name":"admin"}"#);
    }
}
