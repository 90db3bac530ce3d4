//! Host classification for outbound requests.
//!
//! Only literal hostnames and IP literals are inspected. Domain names are
//! passed through without DNS resolution, so a name that resolves to a
//! private address at fetch time is not caught here.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Hostnames rejected by string match before any parsing.
const FORBIDDEN_LITERALS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Address range classification for an IP literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRange {
    Unspecified,
    Loopback,
    Private,
    LinkLocal,
    Multicast,
    Broadcast,
    CarrierGradeNat,
    UniqueLocal,
    Documentation,
    Reserved,
    /// Globally routable unicast.
    Unicast,
}

impl IpRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpRange::Unspecified => "unspecified",
            IpRange::Loopback => "loopback",
            IpRange::Private => "private",
            IpRange::LinkLocal => "linkLocal",
            IpRange::Multicast => "multicast",
            IpRange::Broadcast => "broadcast",
            IpRange::CarrierGradeNat => "carrierGradeNat",
            IpRange::UniqueLocal => "uniqueLocal",
            IpRange::Documentation => "documentation",
            IpRange::Reserved => "reserved",
            IpRange::Unicast => "unicast",
        }
    }
}

/// Check whether a hostname must not be contacted.
///
/// Accepts the bracketed IPv6 form returned by `Url::host_str`.
pub fn is_forbidden(hostname: &str) -> bool {
    let host = hostname
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(hostname);

    if FORBIDDEN_LITERALS.contains(&host) {
        return true;
    }

    match host.parse::<IpAddr>() {
        Ok(ip) => classify(ip) != IpRange::Unicast,
        Err(_) => host.eq_ignore_ascii_case("localhost"),
    }
}

/// Classify an IP address into its range.
pub fn classify(ip: IpAddr) -> IpRange {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

fn classify_v4(addr: Ipv4Addr) -> IpRange {
    let [a, b, c, _] = addr.octets();

    if a == 0 {
        IpRange::Unspecified
    } else if addr.is_broadcast() {
        IpRange::Broadcast
    } else if addr.is_loopback() {
        IpRange::Loopback
    } else if addr.is_private() {
        IpRange::Private
    } else if addr.is_link_local() {
        IpRange::LinkLocal
    } else if addr.is_multicast() {
        IpRange::Multicast
    } else if a == 100 && (b & 0xc0) == 64 {
        IpRange::CarrierGradeNat
    } else if addr.is_documentation() {
        IpRange::Documentation
    } else if a >= 240
        || (a == 192 && b == 0 && c == 0)
        || (a == 192 && b == 88 && c == 99)
        || (a == 198 && (b & 0xfe) == 18)
    {
        // 240/4, IETF protocol assignments, 6to4 relay anycast, benchmarking
        IpRange::Reserved
    } else {
        IpRange::Unicast
    }
}

fn classify_v6(addr: Ipv6Addr) -> IpRange {
    let segments = addr.segments();
    let first = segments[0];

    if addr.is_unspecified() {
        IpRange::Unspecified
    } else if addr.is_loopback() {
        IpRange::Loopback
    } else if let Some(v4) = addr.to_ipv4_mapped() {
        classify_v4(v4)
    } else if (first & 0xff00) == 0xff00 {
        IpRange::Multicast
    } else if (first & 0xffc0) == 0xfe80 {
        IpRange::LinkLocal
    } else if (first & 0xfe00) == 0xfc00 {
        IpRange::UniqueLocal
    } else if first == 0x2001 && segments[1] == 0x0db8 {
        IpRange::Documentation
    } else if first == 0x2002 || (first == 0x2001 && segments[1] == 0) {
        // 6to4 and Teredo tunnel embeddings
        IpRange::Reserved
    } else if (first & 0xe000) == 0x2000 {
        IpRange::Unicast
    } else {
        IpRange::Reserved
    }
}
