use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{client::Client, error::ApiError, response::ApiResponse};

/// BGP session as the controller reports it. Numeric route-map references
/// arrive stringified; the health columns are free-form text.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Bgp {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "siteID")]
    pub site_id: u32,
    #[serde(default)]
    pub neighbor_as: u32,
    #[serde(default, rename = "localIP")]
    pub local_ip: String,
    #[serde(default, rename = "remoteIP")]
    pub remote_ip: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub terminate_on_switch: String,
    #[serde(default, rename = "termSwitchID")]
    pub term_switch_id: u32,
    #[serde(default, rename = "termSwName")]
    pub term_switch_name: String,
    #[serde(default, rename = "nfvID")]
    pub nfv_id: u32,
    #[serde(default, rename = "nfvPortID")]
    pub nfv_port_id: u32,
    #[serde(default, rename = "switchPortID")]
    pub switch_port_id: u32,
    #[serde(default)]
    pub vlan: u32,
    #[serde(default, rename = "rcircuitID")]
    pub rcircuit_id: u32,
    #[serde(default)]
    pub neighbor_address: String,
    #[serde(default)]
    pub update_source: String,
    #[serde(default)]
    pub multihop: u32,
    #[serde(default)]
    pub bgp_password: String,
    #[serde(default)]
    pub allowas_in: u32,
    #[serde(default)]
    pub originate: String,
    #[serde(default, rename = "ipVersion")]
    pub ip_version: String,
    #[serde(default)]
    pub inbound_route_map: String,
    #[serde(default)]
    pub outbound_route_map: String,
    #[serde(default)]
    pub local_preference: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub prepend_inbound: u32,
    #[serde(default)]
    pub prepend_outbound: u32,
    #[serde(default)]
    pub prefix_length: u32,
    #[serde(default)]
    pub prefix_list_inbound: String,
    #[serde(default)]
    pub prefix_list_outbound: String,
    #[serde(default)]
    pub community: String,
    #[serde(default)]
    pub bgp_state: String,
    #[serde(default)]
    pub bgp_prefixes: String,
    #[serde(default)]
    pub bgp_uptime: String,
    #[serde(default)]
    pub port_status: String,
    #[serde(default)]
    pub modified_date: u64,
}

/// Write payload. The endpoint wants the neighbor AS and prefix limit as
/// strings and an explicit null for an unset multihop neighbor.
#[serde_as]
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BgpAdd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    #[serde(rename = "siteID")]
    pub site_id: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub neighbor_as: u32,
    #[serde(rename = "localIP")]
    pub local_ip: String,
    #[serde(rename = "remoteIP")]
    pub remote_ip: String,
    pub description: String,
    pub status: String,
    pub terminate_on_switch: String,
    #[serde(rename = "termSwitchID")]
    pub term_switch_id: u32,
    #[serde(rename = "termSwitchName")]
    pub term_switch_name: String,
    #[serde(rename = "nfvID")]
    pub nfv_id: u32,
    #[serde(rename = "nfvPortID")]
    pub nfv_port_id: u32,
    #[serde(rename = "switchID")]
    pub switch_id: u32,
    pub switch_name: String,
    #[serde(rename = "switchPortID")]
    pub switch_port_id: u32,
    pub vlan: u32,
    #[serde(rename = "rcircuitID")]
    pub rcircuit_id: u32,
    pub neighbor_address: Option<String>,
    pub update_source: String,
    pub multihop: u32,
    pub bgp_password: String,
    pub allowas_in: u32,
    pub originate: String,
    #[serde_as(as = "DisplayFromStr")]
    pub prefix_limit: u32,
    #[serde(rename = "ipVersion")]
    pub ip_version: String,
    pub inbound_route_map: u32,
    pub outbound_route_map: u32,
    pub local_preference: u32,
    pub weight: u32,
    pub prepend_inbound: u32,
    pub prepend_outbound: u32,
    pub prefix_length: u32,
    pub prefix_list_inbound: String,
    pub prefix_list_outbound: String,
    pub community: String,
}

impl Client {
    pub async fn list_bgps(&self) -> Result<Vec<Bgp>, ApiError> {
        self.list("/api/v2/bgp").await
    }

    pub async fn add_bgp(&self, bgp: &BgpAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/bgp", bgp).await
    }

    pub async fn update_bgp(&self, id: u32, bgp: &BgpAdd) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/bgp/{id}"), bgp).await
    }

    pub async fn delete_bgp(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/bgp/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_payload_stringifies_the_legacy_numeric_fields() {
        let add = BgpAdd {
            name: "iris-upstream".to_owned(),
            neighbor_as: 23456,
            prefix_limit: 1000,
            ..Default::default()
        };

        let value = serde_json::to_value(&add).unwrap();
        assert_eq!(value["neighborAs"], "23456");
        assert_eq!(value["prefixLimit"], "1000");
        assert_eq!(value["neighborAddress"], serde_json::Value::Null);
        assert!(value.get("id").is_none());
    }
}
