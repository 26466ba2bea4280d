//! Identity atoms.
//!
//! LaneId/LensId: user- or registry-chosen names
//! LensInstanceId/MaterialId/ClipId: generated at placement time
//! DraftId: content-addressed, derived from canonical draft identity
//! CellKey: "lane:row" grid addressing

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidId};

/// Alphabet for generated id suffixes (lowercase alphanumeric).
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Suffix length for generated ids.
const ID_SUFFIX_LEN: usize = 8;

fn generate_suffix(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}

fn check_name(raw: &str, what: &str) -> Result<(), String> {
    if raw.is_empty() {
        return Err("empty".into());
    }
    if raw.contains(':') {
        return Err(format!("{what} must not contain ':'"));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(format!("{what} must not contain whitespace"));
    }
    Ok(())
}

macro_rules! display_impls {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($ty), "({:?})"), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Lane identifier - non-empty, no ':' (reserved for cell keys).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(String);

impl LaneId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        check_name(&s, "lane id")
            .map_err(|reason| InvalidId::Lane { raw: s.clone(), reason })?;
        Ok(Self(s))
    }

    /// Generate a fresh lane id.
    pub fn generate() -> Self {
        Self(format!("lane-{}", generate_suffix(6)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(LaneId);

/// Lens (plug-in) identifier - the registry key, e.g. `pulse`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LensId(String);

impl LensId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        check_name(&s, "lens id")
            .map_err(|reason| InvalidId::Lens { raw: s.clone(), reason })?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(LensId);

/// Lens instance identifier - "li-{suffix}", generated at placement.
///
/// Lives exactly as long as the instance occupies a grid cell.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LensInstanceId(String);

impl LensInstanceId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        let Some(rest) = s.strip_prefix("li-") else {
            return Err(InvalidId::LensInstance {
                raw: s,
                reason: "must start with 'li-'".into(),
            }
            .into());
        };
        if rest.is_empty() || !rest.bytes().all(|c| ID_ALPHABET.contains(&c)) {
            return Err(InvalidId::LensInstance {
                raw: s,
                reason: "suffix must be lowercase alphanumeric".into(),
            }
            .into());
        }
        Ok(Self(s))
    }

    pub fn generate() -> Self {
        Self(format!("li-{}", generate_suffix(ID_SUFFIX_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(LensInstanceId);

/// Draft identifier - "draft_{hex8}", a content hash.
///
/// A pure function of the draft's canonical identity; identical inputs
/// always yield the identical id, across processes and runs.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        let Some(rest) = s.strip_prefix("draft_") else {
            return Err(InvalidId::Draft {
                raw: s,
                reason: "must start with 'draft_'".into(),
            }
            .into());
        };
        if rest.len() != 8 || !rest.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(InvalidId::Draft {
                raw: s,
                reason: "suffix must be 8 lowercase hex chars".into(),
            }
            .into());
        }
        Ok(Self(s))
    }

    /// Build from a 32-bit content hash.
    pub fn from_hash(hash: u32) -> Self {
        Self(format!("draft_{hash:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(DraftId);

/// Material identifier - "mat-{suffix}", generated at promotion.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(String);

impl MaterialId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if !s.starts_with("mat-") || s.len() == 4 {
            return Err(InvalidId::Material {
                raw: s,
                reason: "must be 'mat-' plus a suffix".into(),
            }
            .into());
        }
        Ok(Self(s))
    }

    pub fn generate() -> Self {
        Self(format!("mat-{}", generate_suffix(ID_SUFFIX_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(MaterialId);

/// Clip identifier - "clip-{suffix}", generated at placement on the desk.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if !s.starts_with("clip-") || s.len() == 5 {
            return Err(InvalidId::Clip {
                raw: s,
                reason: "must be 'clip-' plus a suffix".into(),
            }
            .into());
        }
        Ok(Self(s))
    }

    pub fn generate() -> Self {
        Self(format!("clip-{}", generate_suffix(ID_SUFFIX_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

display_impls!(ClipId);

/// Grid cell address - `"<laneId>:<row>"`, the sole placement scheme.
///
/// Serializes as the string form so it can key JSON maps.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellKey {
    pub lane: LaneId,
    pub row: u32,
}

impl CellKey {
    pub fn new(lane: LaneId, row: u32) -> Self {
        Self { lane, row }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let Some((lane, row)) = s.rsplit_once(':') else {
            return Err(InvalidId::Cell {
                raw: s.to_string(),
                reason: "expected '<laneId>:<row>'".into(),
            }
            .into());
        };
        let row: u32 = row.parse().map_err(|_| InvalidId::Cell {
            raw: s.to_string(),
            reason: "row must be a non-negative integer".into(),
        })?;
        let lane = LaneId::parse(lane).map_err(|_| InvalidId::Cell {
            raw: s.to_string(),
            reason: "lane part is not a valid lane id".into(),
        })?;
        Ok(Self { lane, row })
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellKey({}:{})", self.lane, self.row)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lane, self.row)
    }
}

impl TryFrom<String> for CellKey {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        CellKey::parse(&s)
    }
}

impl From<CellKey> for String {
    fn from(key: CellKey) -> String {
        key.to_string()
    }
}
