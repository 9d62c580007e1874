//! Address family labelling.

use std::fmt;
use std::net::IpAddr;

/// Address family of a lookup record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Inet,
    Inet6,
    /// Any other family, carrying its raw platform number
    Other(i32),
}

impl AddressFamily {
    /// "IPv4", "IPv6", or `"AF_<n>"` for anything else.
    pub fn label(&self) -> String {
        match self {
            AddressFamily::Inet => "IPv4".to_string(),
            AddressFamily::Inet6 => "IPv6".to_string(),
            AddressFamily::Other(raw) => format!("AF_{raw}"),
        }
    }
}

impl From<&IpAddr> for AddressFamily {
    fn from(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Inet,
            IpAddr::V6(_) => AddressFamily::Inet6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
