//! Candidate descriptor parsing and private range classification

use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;

/// Origin of a negotiation candidate, from its `typ` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    /// Local interface address
    Host,
    /// Address as seen by a STUN server (`srflx`)
    ServerReflexive,
    /// Address learned from the remote peer (`prflx`)
    PeerReflexive,
    /// TURN relay; never a local address
    Relay,
}

impl CandidateType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "host" => Some(Self::Host),
            "srflx" => Some(Self::ServerReflexive),
            "prflx" => Some(Self::PeerReflexive),
            "relay" => Some(Self::Relay),
            _ => None,
        }
    }

    /// Host, server-reflexive and peer-reflexive candidates originate locally
    pub fn is_local_origin(self) -> bool {
        !matches!(self, Self::Relay)
    }
}

/// The parts of a candidate line discovery cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub address: Option<Ipv4Addr>,
    pub kind: Option<CandidateType>,
}

impl Candidate {
    /// Parses `candidate:...` or `a=candidate:...` as streamed during gathering.
    ///
    /// The address is the connection-address field when it is IPv4, otherwise
    /// the first dotted quad anywhere in the line. For an mDNS (`.local`) or
    /// IPv6 candidate that can be its `raddr`; the `typ` check in
    /// [`Candidate::local_private_address`] still applies to it.
    pub fn parse(line: &str) -> Option<Self> {
        let body = candidate_body(line)?;
        let fields: Vec<&str> = body.split_whitespace().collect();
        let address = connection_field(&fields).or_else(|| extract_ipv4(body));
        let kind = fields
            .iter()
            .position(|field| *field == "typ")
            .and_then(|i| fields.get(i + 1))
            .and_then(|token| CandidateType::parse(token));

        Some(Self { address, kind })
    }

    /// Private address of a local-origin candidate, if it has one
    pub fn local_private_address(&self) -> Option<Ipv4Addr> {
        let kind = self.kind?;
        let address = self.address?;
        (kind.is_local_origin() && is_private(address)).then_some(address)
    }
}

fn candidate_body(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix("a=").unwrap_or(line).strip_prefix("candidate:")
}

/// Field 4 of a candidate body (after foundation, component, transport, priority)
fn connection_field(fields: &[&str]) -> Option<Ipv4Addr> {
    fields.get(4).and_then(|field| field.parse().ok())
}

/// IPv4 connection address of a candidate line, ignoring every other field
pub fn connection_address(line: &str) -> Option<Ipv4Addr> {
    let fields: Vec<&str> = candidate_body(line)?.split_whitespace().collect();
    connection_field(&fields)
}

fn ipv4_regex() -> &'static Regex {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| {
        Regex::new(r"\b[0-9]{1,3}(?:\.[0-9]{1,3}){3}\b").expect("IPv4 pattern is valid")
    })
}

/// First dotted quad in `text` whose octets are all in range
pub fn extract_ipv4(text: &str) -> Option<Ipv4Addr> {
    ipv4_regex()
        .find_iter(text)
        .find_map(|m| m.as_str().parse::<Ipv4Addr>().ok())
}

/// 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16, checked octet by octet
pub fn is_private(address: Ipv4Addr) -> bool {
    match address.octets() {
        [10, ..] => true,
        [172, second, ..] => (16..=31).contains(&second),
        [192, 168, ..] => true,
        _ => false,
    }
}

/// First private connection address on an `a=candidate:` line of a session
/// description. Only the connection-address field is read, so a private
/// `raddr` behind an mDNS or IPv6 candidate is not reported.
pub fn scan_description(sdp: &str) -> Option<Ipv4Addr> {
    sdp.lines()
        .filter(|line| line.trim_start().starts_with("a=candidate:"))
        .filter_map(connection_address)
        .find(|address| is_private(*address))
}
