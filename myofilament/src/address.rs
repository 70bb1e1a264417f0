//! Entity addressing for cross-structure links and snapshots.
//!
//! Every entity in the half-sarcomere carries an [`Address`]: its kind
//! plus the indices locating it at each level of the hierarchy. Links
//! between structures (crossbridge ↔ binding site, titin endpoints,
//! face ↔ opposing face) are stored as addresses or as the light id
//! types below rather than as pointers, so that ownership stays with
//! the half-sarcomere and serialization stays a plain value tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an entity inside a half-sarcomere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Address {
    /// A thin filament.
    ThinFil { fil: usize },
    /// A face of a thin filament.
    ThinFace { fil: usize, face: usize },
    /// A binding site, indexed along its thin filament.
    Bs { fil: usize, site: usize },
    /// A tropomyosin strand on a thin filament.
    Tm { fil: usize, strand: usize },
    /// A tropomyosin site, indexed along its strand.
    TmSite { fil: usize, strand: usize, site: usize },
    /// A thick filament.
    ThickFil { fil: usize },
    /// A crown, indexed along its thick filament.
    Crown { fil: usize, crown: usize },
    /// A face of a thick filament.
    ThickFace { fil: usize, face: usize },
    /// A crossbridge, indexed along its thick face.
    Xb { fil: usize, face: usize, xb: usize },
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::ThinFil { fil } => write!(f, "thin_fil[{fil}]"),
            Address::ThinFace { fil, face } => write!(f, "thin_face[{fil}][{face}]"),
            Address::Bs { fil, site } => write!(f, "bs[{fil}][{site}]"),
            Address::Tm { fil, strand } => write!(f, "tm[{fil}][{strand}]"),
            Address::TmSite { fil, strand, site } => {
                write!(f, "tm_site[{fil}][{strand}][{site}]")
            }
            Address::ThickFil { fil } => write!(f, "thick_fil[{fil}]"),
            Address::Crown { fil, crown } => write!(f, "crown[{fil}][{crown}]"),
            Address::ThickFace { fil, face } => write!(f, "thick_face[{fil}][{face}]"),
            Address::Xb { fil, face, xb } => write!(f, "xb[{fil}][{face}][{xb}]"),
        }
    }
}

/// Identifies a thin face: `(filament, face)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThinFaceId {
    pub filament: usize,
    pub face: usize,
}

/// Identifies a thick face: `(filament, face)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThickFaceId {
    pub filament: usize,
    pub face: usize,
}

/// Identifies a binding site: `(filament, site index along the filament)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId {
    pub filament: usize,
    pub site: usize,
}

/// Identifies a crossbridge: `(filament, face, index along the face)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XbId {
    pub filament: usize,
    pub face: usize,
    pub index: usize,
}

impl SiteId {
    pub fn address(&self) -> Address {
        Address::Bs { fil: self.filament, site: self.site }
    }
}

impl XbId {
    pub fn address(&self) -> Address {
        Address::Xb { fil: self.filament, face: self.face, xb: self.index }
    }
}

impl ThinFaceId {
    pub fn address(&self) -> Address {
        Address::ThinFace { fil: self.filament, face: self.face }
    }
}

impl ThickFaceId {
    pub fn address(&self) -> Address {
        Address::ThickFace { fil: self.filament, face: self.face }
    }
}
