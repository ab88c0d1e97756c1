//! Platform connectivity signal.

use tokio::sync::broadcast;

/// A connectivity transition observed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The device became reachable.
    Online,
    /// The device lost connectivity.
    Offline,
}

/// Boolean "currently online" check plus an event source for
/// online/offline transitions.
///
/// The engine never polls; it does one-shot checks at well-defined
/// points and otherwise reacts to the event stream.
pub trait Connectivity: Send + Sync {
    /// Current connectivity, evaluated once.
    fn is_online(&self) -> bool;

    /// Subscribe to connectivity transitions.
    ///
    /// Each call returns an independent receiver; events sent before
    /// subscription are not replayed.
    fn events(&self) -> broadcast::Receiver<ConnectivityEvent>;
}
