//! Capability tokens for privileged operations.
//!
//! Access control is capability-based rather than identity-based: holding
//! an [`AdminCap`] is the right to administer, holding a registered
//! [`SettlerCap`] is the right to write order state on behalf of
//! settlement. Both have private fields so they cannot be forged outside
//! this crate; [`Capabilities::bootstrap`] mints the admin capability once
//! per deployment.

/// The right to administer markets, fees, and settler registration.
#[derive(Debug)]
pub struct AdminCap {
    _priv: (),
}

/// The right to perform settlement writes (order-state updates).
///
/// Issued by the auction house against an [`AdminCap`]; the house checks
/// the id against its registry so a capability can be revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettlerCap {
    id: u64,
}

impl SettlerCap {
    /// Construct a capability with a given registry id.
    ///
    /// Only meaningful when the id was issued by the auction house; an
    /// unregistered id fails every privileged call.
    #[must_use]
    pub fn with_id(id: u64) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One-time bootstrap for a deployment's capability set.
pub struct Capabilities;

impl Capabilities {
    /// Mint the deployment's admin capability.
    #[must_use]
    pub fn bootstrap() -> AdminCap {
        AdminCap { _priv: () }
    }
}
