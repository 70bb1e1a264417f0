//! Error types for the half-sarcomere model.

use crate::address::Address;
use thiserror::Error;

/// Result type for half-sarcomere operations.
pub type Result<T> = std::result::Result<T, SarcomereError>;

/// Errors that can occur while configuring, running, or restoring a
/// half-sarcomere.
#[derive(Error, Debug)]
pub enum SarcomereError {
    /// Invalid parameter value.
    #[error("invalid parameter {parameter}: {reason} (value: {value})")]
    InvalidParameter {
        parameter: String,
        value: f64,
        reason: String,
    },

    /// A time-dependence trace is shorter than the run needs.
    #[error("time dependence '{key}' has {found} entries, needs at least {expected}")]
    TimeDependenceLength {
        key: String,
        expected: usize,
        found: usize,
    },

    /// Wrong number of filament start offsets.
    #[error("expected {expected} {which} start offsets, got {found}")]
    StartCount {
        which: &'static str,
        expected: usize,
        found: usize,
    },

    /// Isoform cluster entry points outside the profile list.
    #[error("isoform cluster entry {index} out of range ({len} profiles)")]
    IsoformIndex { index: usize, len: usize },

    /// Cluster assignment given without isoform profiles.
    #[error("mh_cluster given without mh_iso profiles")]
    ClusterWithoutProfiles,

    /// An address cannot be resolved to an entity.
    #[error("unresolvable address: {0}")]
    UnresolvableAddress(Address),

    /// A snapshot entity does not sit where its address claims.
    #[error("address mismatch: snapshot has {found}, structure has {expected}")]
    AddressMismatch { expected: Address, found: Address },

    /// Two crossbridges claim the same binding site.
    #[error("binding site {0} is already occupied")]
    SiteOccupied(Address),

    /// A snapshot is internally inconsistent.
    #[error("snapshot inconsistency: {0}")]
    Corrupt(String),

    /// Snapshot (de)serialization failure.
    #[error("snapshot serialization: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = SarcomereError::TimeDependenceLength {
            key: "z_line".to_string(),
            expected: 100,
            found: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("z_line"));
        assert!(msg.contains("100"));

        let err = SarcomereError::UnresolvableAddress(Address::ThinFil { fil: 12 });
        assert!(err.to_string().contains("thin_fil[12]"));
    }
}
