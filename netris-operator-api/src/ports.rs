use serde::Deserialize;

use crate::{client::Client, error::ApiError};

/// Physical switch port. Specs reference ports as `<port>@<switch>`,
/// which `qualified_name` reproduces.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub switch_name: String,
    #[serde(default, rename = "switchID")]
    pub switch_id: u32,
    #[serde(default)]
    pub tenant_id: u32,
    #[serde(default, rename = "siteID")]
    pub site_id: u32,
    #[serde(default, rename = "parent_port")]
    pub parent_port: u32,
    #[serde(default)]
    pub vlan: String,
}

impl Port {
    pub fn qualified_name(&self) -> String {
        format!("{}@{}", self.port, self.switch_name)
    }
}

impl Client {
    pub async fn list_ports(&self) -> Result<Vec<Port>, ApiError> {
        self.list("/api/v2/ports").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_matches_the_spec_notation() {
        let port = Port {
            port: "swp7".to_owned(),
            switch_name: "leaf-21".to_owned(),
            ..Default::default()
        };

        assert_eq!(port.qualified_name(), "swp7@leaf-21");
    }
}
