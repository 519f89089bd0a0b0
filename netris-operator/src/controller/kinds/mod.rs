use k8s_openapi::chrono::{DateTime, TimeZone, Utc};
use netris_operator_api::{AddReply, ApiResponse};

use super::error::ReconcilerError;

pub mod allocation;
pub mod bgp;
pub mod controller;
pub mod ebgp;
pub mod inventory_profile;
pub mod l4lb;
pub mod link;
pub mod nat;
pub mod server;
pub mod server_cluster;
pub mod server_cluster_template;
pub mod site;
pub mod softgate;
pub mod subnet;
pub mod switch;
pub mod vnet;
pub mod vpc;

/// Fresh remote ID out of an add reply envelope.
fn added_id(response: ApiResponse) -> Result<u32, ReconcilerError> {
    Ok(response.ok()?.decode::<AddReply>()?.id)
}

/// Checks the envelope of calls whose reply payload doesn't matter.
fn ensure_ok(response: ApiResponse) -> Result<(), ReconcilerError> {
    response.ok()?;

    Ok(())
}

/// Controller modification stamps come as Unix milliseconds; zero means the
/// controller never reported one.
fn modified_timestamp(millis: u64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }

    Utc.timestamp_opt((millis / 1000) as i64, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modification_stamps_drop_the_millisecond_part() {
        let stamp = modified_timestamp(1_620_000_000_500).unwrap();

        assert_eq!(stamp.timestamp(), 1_620_000_000);
        assert!(modified_timestamp(0).is_none());
    }
}
