use std::{fmt::Display, net::IpAddr, str::FromStr};

use ipnet::IpNet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpParseError {
    #[error("Couldn't parse IP CIDR: {}", .0)]
    InvalidCidr(ipnet::AddrParseError),
}

/// An address written in `<ip>/<length>` notation with the host bits kept,
/// the form users give gateways and BGP session addresses in. The Netris API
/// wants it split into address, prefix length and version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayAddr {
    net: IpNet,
}

impl GatewayAddr {
    pub fn address(&self) -> IpAddr {
        self.net.addr()
    }

    pub fn length(&self) -> u8 {
        self.net.prefix_len()
    }

    pub fn version(&self) -> &'static str {
        match self.net {
            IpNet::V4(_) => "ipv4",
            IpNet::V6(_) => "ipv6",
        }
    }

    /// The network this address lives in, host bits cleared.
    pub fn prefix(&self) -> IpNet {
        self.net.trunc()
    }
}

impl FromStr for GatewayAddr {
    type Err = IpParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(GatewayAddr {
            net: value.parse().map_err(IpParseError::InvalidCidr)?,
        })
    }
}

impl Display for GatewayAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.net.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_splits_into_address_and_length() {
        let gateway: GatewayAddr = "10.0.0.1/24".parse().unwrap();

        assert_eq!(gateway.address(), "10.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(gateway.length(), 24);
        assert_eq!(gateway.version(), "ipv4");
        assert_eq!(gateway.prefix().to_string(), "10.0.0.0/24");
        assert_eq!(gateway.to_string(), "10.0.0.1/24");
    }

    #[test]
    fn gateway_recognizes_ipv6() {
        let gateway: GatewayAddr = "2001:db8::1/64".parse().unwrap();

        assert_eq!(gateway.length(), 64);
        assert_eq!(gateway.version(), "ipv6");
    }

    #[test]
    fn gateway_rejects_bare_addresses() {
        assert!("10.0.0.1".parse::<GatewayAddr>().is_err());
    }
}
