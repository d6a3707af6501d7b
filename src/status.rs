use regex::Regex;
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, sync::OnceLock};

// InterfaceStats is one tunnel interface as reported by `ip -s -j ad`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStats {
    pub name: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub mtu: Option<u64>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BackendState {
    #[default]
    NoState,
    NeedsLogin,
    NeedsMachineAuth,
    Stopped,
    Starting,
    Running,
    #[serde(other)]
    Unknown,
}

// ServiceStatus is the subset of `tailscale status --json` the dashboard shows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceStatus {
    #[serde(rename = "BackendState", default, deserialize_with = "null_to_default")]
    pub backend_state: BackendState,
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
    #[serde(rename = "Self", default)]
    pub self_node: Option<SelfNode>,
    #[serde(rename = "MagicDNSSuffix", default)]
    pub magic_dns_suffix: Option<String>,
    #[serde(rename = "Peer", default, deserialize_with = "ordered_peers")]
    pub peers: Vec<(String, PeerNode)>,
}

impl ServiceStatus {
    pub fn is_running(&self) -> bool {
        self.backend_state == BackendState::Running
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelfNode {
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "null_to_default")]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "UserID", default, deserialize_with = "integer_text")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerNode {
    #[serde(rename = "HostName", default)]
    pub host_name: Option<String>,
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "null_to_default")]
    pub tailscale_ips: Vec<String>,
    #[serde(rename = "OS", default)]
    pub os: Option<String>,
    #[serde(rename = "RxBytes", default, deserialize_with = "byte_count")]
    pub rx_bytes: u64,
    #[serde(rename = "TxBytes", default, deserialize_with = "byte_count")]
    pub tx_bytes: u64,
    #[serde(rename = "Online", default, deserialize_with = "null_to_default")]
    pub online: bool,
    #[serde(rename = "LastSeen", default)]
    pub last_seen: Option<String>,
}

// Snapshot is rebuilt from scratch on every poll.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub interfaces: Vec<InterfaceStats>,
    pub status: Option<ServiceStatus>,
}

/// Raw link record from `ip -j`.
#[derive(Debug, Deserialize)]
pub struct IpLink {
    #[serde(default, deserialize_with = "null_to_default")]
    pub ifname: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub addr_info: Vec<AddrInfo>,
    #[serde(default)]
    pub mtu: Option<u64>,
    #[serde(default)]
    pub stats64: Option<Stats64>,
}

#[derive(Debug, Deserialize)]
pub struct AddrInfo {
    #[serde(default, deserialize_with = "null_to_default")]
    pub family: String,
    #[serde(default)]
    pub local: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Stats64 {
    #[serde(default)]
    pub rx: Option<Counters>,
    #[serde(default)]
    pub tx: Option<Counters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Counters {
    #[serde(default, deserialize_with = "byte_count")]
    pub bytes: u64,
}

impl IpLink {
    fn first_local(&self, family: &str) -> Option<String> {
        self.addr_info
            .iter()
            .find(|a| a.family == family)
            .and_then(|a| a.local.clone())
    }

    pub fn to_stats(&self) -> InterfaceStats {
        let stats = self.stats64.as_ref();
        InterfaceStats {
            name: self.ifname.clone(),
            ipv4: self.first_local("inet"),
            ipv6: self.first_local("inet6"),
            mtu: self.mtu,
            rx_bytes: stats.and_then(|s| s.rx.as_ref()).map_or(0, |c| c.bytes),
            tx_bytes: stats.and_then(|s| s.tx.as_ref()).map_or(0, |c| c.bytes),
        }
    }
}

pub fn first_ipv4(ips: &[String]) -> Option<&str> {
    ips.iter().map(String::as_str).find(|ip| ip.contains('.'))
}

pub fn first_ipv6(ips: &[String]) -> Option<&str> {
    ips.iter().map(String::as_str).find(|ip| ip.contains(':'))
}

fn large_integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"("\w+"):\s*(\d{10,})"#).unwrap())
}

/// Quotes every bare integer literal of ten or more digits that directly
/// follows a quoted field name and a colon, so that `"UserID": 123456789012`
/// becomes `"UserID":"123456789012"`.
///
/// The rewrite is textual: a quoted key/colon/digits run that happens to sit
/// inside a string value is rewritten too. The status payload never carries
/// such strings, and the typed decoders accept both forms either way.
pub fn quote_large_integers(raw: &str) -> std::borrow::Cow<'_, str> {
    large_integer_re().replace_all(raw, r#"${1}:"${2}""#)
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Integer fields may arrive as JSON numbers or, after quote_large_integers,
// as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerRepr {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

fn byte_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IntegerRepr>::deserialize(deserializer)? {
        Some(IntegerRepr::Unsigned(n)) => n,
        Some(IntegerRepr::Text(s)) => s.trim().parse().unwrap_or(0),
        Some(IntegerRepr::Float(f)) if f.is_finite() && f > 0.0 => f as u64,
        _ => 0,
    })
}

fn integer_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IntegerRepr>::deserialize(deserializer)? {
        Some(IntegerRepr::Unsigned(n)) => Some(n.to_string()),
        Some(IntegerRepr::Signed(n)) => Some(n.to_string()),
        Some(IntegerRepr::Text(s)) => Some(s),
        // Precision is already gone at this point.
        Some(IntegerRepr::Float(_)) | None => None,
    })
}

// The peer map is kept in payload order rather than collected into a
// hash or btree map.
fn ordered_peers<'de, D>(deserializer: D) -> Result<Vec<(String, PeerNode)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PeersVisitor;

    impl<'de> Visitor<'de> for PeersVisitor {
        type Value = Vec<(String, PeerNode)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of peer id to peer status, or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_map(self)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut peers = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, peer)) = map.next_entry::<String, PeerNode>()? {
                peers.push((id, peer));
            }
            Ok(peers)
        }
    }

    deserializer.deserialize_option(PeersVisitor)
}
