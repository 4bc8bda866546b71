//! Network observation and best-network resolution.
//!
//! Platform sources feed a [`NetworkMonitor`]; the [`NetworkResolver`] turns its
//! snapshots into the best network per [`NetworkClass`], using the pure
//! [`compute_best`].

mod candidate;
mod monitor;
mod resolver;
mod select;
#[cfg(target_os = "linux")]
pub mod sysfs;

pub use candidate::{
    Capabilities, NetworkCandidate, NetworkClass, NetworkEntry, NetworkId, NetworkSnapshot,
    TransportKind,
};
pub use monitor::NetworkMonitor;
pub use resolver::NetworkResolver;
pub use select::compute_best;
