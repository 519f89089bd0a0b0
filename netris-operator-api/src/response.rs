use serde::{de::DeserializeOwned, Deserialize};

use crate::error::ApiError;

/// Every controller endpoint wraps its payload in the same envelope.
/// `data` stays raw until the caller knows what to decode it into.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiResponse {
    /// Turns a failed envelope into an error carrying the controller's message.
    pub fn ok(self) -> Result<ApiResponse, ApiError> {
        if self.is_success {
            Ok(self)
        } else {
            let message = if self.message.is_empty() {
                "request rejected".to_owned()
            } else {
                self.message
            };
            Err(ApiError::Api(message))
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Reply payload of the add endpoints. VNets historically report the new
/// ID under `circuitID`, everything else under `id`.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct AddReply {
    #[serde(default, alias = "circuitID")]
    pub id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_envelope_surfaces_controller_message() {
        let raw = r#"{"isSuccess":false,"message":"vnet name already in use","data":null}"#;
        let response: ApiResponse = serde_json::from_str(raw).unwrap();

        match response.ok() {
            Err(ApiError::Api(message)) => assert_eq!(message, "vnet name already in use"),
            other => panic!("expected an api error, got {other:?}"),
        }
    }

    #[test]
    fn add_reply_reads_both_id_spellings() {
        let plain: AddReply = serde_json::from_str(r#"{"id":42}"#).unwrap();
        let vnet: AddReply = serde_json::from_str(r#"{"circuitID":17}"#).unwrap();

        assert_eq!(plain.id, 42);
        assert_eq!(vnet.id, 17);
    }

    #[test]
    fn successful_envelope_decodes_data_in_place() {
        let raw = r#"{"isSuccess":true,"message":"","data":[{"id":1,"name":"yerevan"}]}"#;
        let response: ApiResponse = serde_json::from_str(raw).unwrap();
        let sites: Vec<crate::IdName> = response.ok().unwrap().decode().unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "yerevan");
    }
}
