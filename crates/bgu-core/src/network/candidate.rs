//! Network handles, capability snapshots and usage classes.

use serde::Serialize;

/// Opaque identity of a live network (OS handle / ifindex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NetworkId(pub u64);

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Wifi,
    Cellular,
    Ethernet,
    Vpn,
    #[default]
    Other,
}

impl TransportKind {
    /// Wi-Fi and wired links count as "Wi-Fi-like" for constrained-preferred jobs.
    pub fn is_wifi_like(self) -> bool {
        matches!(self, TransportKind::Wifi | TransportKind::Ethernet)
    }
}

/// Capability snapshot of one network at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub has_internet: bool,
    pub validated: bool,
    pub metered: bool,
    pub restricted: bool,
    pub suspended: bool,
    pub trusted: bool,
    pub roaming: bool,
    pub transport: TransportKind,
    /// Estimated link bandwidth in kbit/s (0 when unknown).
    pub bandwidth_kbps: u64,
    /// Interface name to bind sockets to, when the platform exposes one.
    pub interface: Option<String>,
}

impl Capabilities {
    /// A validated, unrestricted, unmetered, trusted internet link on `transport`.
    pub fn usable(transport: TransportKind) -> Self {
        Self {
            has_internet: true,
            validated: true,
            metered: transport == TransportKind::Cellular,
            restricted: false,
            suspended: false,
            trusted: true,
            roaming: false,
            transport,
            bandwidth_kbps: 0,
            interface: None,
        }
    }

    pub fn with_bandwidth(mut self, kbps: u64) -> Self {
        self.bandwidth_kbps = kbps;
        self
    }
}

/// A live network plus the capabilities it had when it was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkCandidate {
    pub id: NetworkId,
    pub caps: Capabilities,
}

/// One listed network. `caps` is `None` when the capability lookup failed
/// (network torn down mid-lookup) or the network is blocked: listed, not usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEntry {
    pub id: NetworkId,
    pub caps: Option<Capabilities>,
}

/// Everything the OS currently reports, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NetworkSnapshot {
    /// The OS default network, if any.
    pub active: Option<NetworkId>,
    pub networks: Vec<NetworkEntry>,
}

/// Grouping of jobs by network preference; each class has its own best network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkClass {
    #[default]
    Default,
    /// Only unmetered, Wi-Fi-like networks.
    ConstrainedPreferred,
}

impl NetworkClass {
    pub const ALL: [NetworkClass; 2] = [NetworkClass::Default, NetworkClass::ConstrainedPreferred];

    /// Mandatory capability filter for this class.
    pub fn admits(self, caps: &Capabilities) -> bool {
        let base = caps.has_internet && caps.validated && !caps.restricted && !caps.suspended;
        match self {
            NetworkClass::Default => base,
            NetworkClass::ConstrainedPreferred => {
                base && !caps.metered && caps.transport.is_wifi_like()
            }
        }
    }
}
