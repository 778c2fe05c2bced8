//! Wallet connector seam.
//!
//! The actual wallet session (key custody, chain switching, signing) lives in
//! an external connector; this module only models the slice the identity flow
//! needs: the connected address, the chain, and connect/disconnect.  Address
//! change notifications are delivered by the embedding application calling
//! [`crate::session::Session::resolve`] with the new address.

use serde::{Deserialize, Serialize};

/// Chain the site operates on.  Addresses are validated against this.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Which external connector the user picked in the connect dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Browser-injected provider.
    Injected,
    WalletConnect,
    Coinbase,
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorKind::Injected => write!(f, "injected"),
            ConnectorKind::WalletConnect => write!(f, "walletconnect"),
            ConnectorKind::Coinbase => write!(f, "coinbase"),
        }
    }
}

#[derive(Debug)]
pub enum WalletError {
    /// No wallet is available for the requested connector kind.
    Unavailable(String),
    /// The user rejected the connection request.
    Rejected,
    NotConnected,
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::Unavailable(kind) => write!(f, "no wallet available for {kind}"),
            WalletError::Rejected => write!(f, "connection rejected by user"),
            WalletError::NotConnected => write!(f, "no wallet connected"),
        }
    }
}

impl std::error::Error for WalletError {}

/// The connector surface consumed by the identity flow.
///
/// `disconnect` must be idempotent: disconnecting an already-disconnected
/// wallet is a no-op, not an error.
pub trait WalletConnector {
    /// Currently connected address, if any.
    fn address(&self) -> Option<String>;

    /// Chain the wallet is on, if connected.
    fn chain_id(&self) -> Option<u64>;

    /// Establish a connection via the given connector kind and return the
    /// connected address.
    fn connect(&mut self, kind: ConnectorKind) -> Result<String, WalletError>;

    /// Drop the connection.
    fn disconnect(&mut self) -> Result<(), WalletError>;
}

/// Connector backed by an address announced out-of-process, e.g. by a browser
/// wallet that reports its address to the server.  Also serves as the test
/// double for the resolver suites.
#[derive(Debug, Default)]
pub struct AnnouncedConnector {
    address: Option<String>,
    chain_id: u64,
}

impl AnnouncedConnector {
    pub fn new(chain_id: u64) -> Self {
        Self {
            address: None,
            chain_id,
        }
    }

    /// Record the address the external wallet reported.
    pub fn announce(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
    }
}

impl WalletConnector for AnnouncedConnector {
    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    fn chain_id(&self) -> Option<u64> {
        self.address.as_ref().map(|_| self.chain_id)
    }

    fn connect(&mut self, kind: ConnectorKind) -> Result<String, WalletError> {
        self.address
            .clone()
            .ok_or_else(|| WalletError::Unavailable(kind.to_string()))
    }

    fn disconnect(&mut self) -> Result<(), WalletError> {
        self.address = None;
        Ok(())
    }
}

/// Whether `address` is a well-formed EVM address: `0x` followed by exactly
/// 40 hex digits.  Checksum casing is not enforced.
pub fn is_valid_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Canonical form used as a cache and store key: lowercased.
pub fn normalize_address(address: &str) -> String {
    address.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_addresses() {
        assert!(is_valid_address(
            "0x52908400098527886E0F7030069857D2E4169EE7"
        ));
        assert!(is_valid_address(
            "0xde709f2102306220921060314715629080e2fb77"
        ));
    }

    #[test]
    fn invalid_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0xABC"));
        assert!(!is_valid_address("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!is_valid_address(
            "0x52908400098527886E0F7030069857D2E4169EZZ"
        ));
        assert!(!is_valid_address(
            "0x52908400098527886E0F7030069857D2E4169EE70"
        ));
    }

    #[test]
    fn normalize_lowercases() {
        assert_eq!(
            normalize_address("0x52908400098527886E0F7030069857D2E4169EE7"),
            "0x52908400098527886e0f7030069857d2e4169ee7"
        );
    }

    #[test]
    fn announced_connector_lifecycle() {
        let mut conn = AnnouncedConnector::new(DEFAULT_CHAIN_ID);
        assert!(conn.address().is_none());
        assert!(conn.connect(ConnectorKind::Injected).is_err());

        conn.announce("0xde709f2102306220921060314715629080e2fb77");
        assert_eq!(conn.chain_id(), Some(DEFAULT_CHAIN_ID));
        assert_eq!(
            conn.connect(ConnectorKind::Injected).unwrap(),
            "0xde709f2102306220921060314715629080e2fb77"
        );

        // Disconnect twice: second call is still Ok.
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert!(conn.address().is_none());
    }
}
