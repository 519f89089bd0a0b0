use serde::{Deserialize, Serialize};

use crate::{client::Client, error::ApiError, response::ApiResponse};

/// Inventory profile as listed by the controller. The timezone arrives as a
/// JSON document embedded in a string; `tz_code` digs the code out of it.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, rename = "ipv4SSH")]
    pub ipv4_ssh: String,
    #[serde(default, rename = "ipv6SSH")]
    pub ipv6_ssh: String,
    #[serde(default, rename = "ntpServers")]
    pub ntp_servers: String,
    #[serde(default, rename = "dnsServers")]
    pub dns_servers: String,
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
    #[serde(default)]
    pub modified_date: u64,
}

impl Profile {
    pub fn tz_code(&self) -> String {
        serde_json::from_str::<TimezoneRef>(&self.timezone)
            .map(|tz| tz.tz_code)
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    #[serde(default)]
    pub src_subnet: String,
    #[serde(default)]
    pub src_port: String,
    #[serde(default)]
    pub dst_port: String,
    #[serde(default)]
    pub protocol: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TimezoneRef {
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "tzCode")]
    pub tz_code: String,
}

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAdd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    pub description: String,
    pub timezone: TimezoneRef,
    #[serde(rename = "ipv4List")]
    pub ipv4_list: String,
    #[serde(rename = "ipv6List")]
    pub ipv6_list: String,
    #[serde(rename = "ntpServers")]
    pub ntp_servers: String,
    #[serde(rename = "dnsServers")]
    pub dns_servers: String,
    pub custom_rules: Vec<CustomRule>,
}

impl Client {
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.list("/api/v2/inventory-profiles").await
    }

    pub async fn add_profile(&self, profile: &ProfileAdd) -> Result<ApiResponse, ApiError> {
        self.post("/api/v2/inventory-profiles", profile).await
    }

    pub async fn update_profile(
        &self,
        id: u32,
        profile: &ProfileAdd,
    ) -> Result<ApiResponse, ApiError> {
        self.put(&format!("/api/v2/inventory-profiles/{id}"), profile)
            .await
    }

    pub async fn delete_profile(&self, id: u32) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/api/v2/inventory-profiles/{id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tz_code_unwraps_the_embedded_document() {
        let profile = Profile {
            timezone: r#"{"label":"Asia/Yerevan","tzCode":"Asia/Yerevan"}"#.to_owned(),
            ..Default::default()
        };

        assert_eq!(profile.tz_code(), "Asia/Yerevan");
        assert_eq!(Profile::default().tz_code(), "");
    }
}
