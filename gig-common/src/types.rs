//! Object and record keys
//!
//! Flag and redshift ledgers key their rows on (object, position angle);
//! morphology ledgers key them on (object, cluster).

use crate::{Error, Result};
use std::fmt;

/// Catalog object identifier, printed zero-padded to five digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn parse(token: &str) -> Option<Self> {
        token.trim().parse::<u32>().ok().map(ObjectId)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

/// Observing position angle in whole degrees, printed zero-padded to three digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionAngle(pub u16);

impl PositionAngle {
    pub fn parse(token: &str) -> Option<Self> {
        token.trim().parse::<u16>().ok().map(PositionAngle)
    }
}

impl fmt::Display for PositionAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Galaxy cluster name used by postage-stamp catalogs (e.g. `A2744`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterTag(pub String);

impl ClusterTag {
    pub fn new(name: impl Into<String>) -> Self {
        ClusterTag(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry of the ordered object list
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub id: ObjectId,
    pub cluster: Option<ClusterTag>,
}

impl ObjectKey {
    pub fn new(id: u32) -> Self {
        Self {
            id: ObjectId(id),
            cluster: None,
        }
    }

    pub fn in_cluster(id: u32, cluster: impl Into<String>) -> Self {
        Self {
            id: ObjectId(id),
            cluster: Some(ClusterTag::new(cluster)),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cluster {
            Some(cluster) => write!(f, "{}_{}", cluster, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// How the two leading columns of a ledger row are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// `<id:05> <pa:03>`
    PositionAngle,
    /// `<id:05> <cluster>`
    Cluster,
}

/// Identity of one ledger row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Pa(ObjectId, PositionAngle),
    Cluster(ObjectId, ClusterTag),
}

impl RecordKey {
    /// Parse the two leading tokens of a row
    pub fn parse(style: KeyStyle, id: &str, second: &str) -> Result<Self> {
        let object = ObjectId::parse(id)
            .ok_or_else(|| Error::MalformedRecord(format!("invalid object id '{}'", id)))?;
        match style {
            KeyStyle::PositionAngle => {
                let pa = PositionAngle::parse(second).ok_or_else(|| {
                    Error::MalformedRecord(format!("invalid position angle '{}'", second))
                })?;
                Ok(RecordKey::Pa(object, pa))
            }
            KeyStyle::Cluster => {
                if second.is_empty() || second.starts_with('#') {
                    return Err(Error::MalformedRecord(format!(
                        "invalid cluster '{}'",
                        second
                    )));
                }
                Ok(RecordKey::Cluster(object, ClusterTag::new(second)))
            }
        }
    }

    pub fn object_id(&self) -> ObjectId {
        match self {
            RecordKey::Pa(id, _) | RecordKey::Cluster(id, _) => *id,
        }
    }

    pub fn position_angle(&self) -> Option<PositionAngle> {
        match self {
            RecordKey::Pa(_, pa) => Some(*pa),
            RecordKey::Cluster(..) => None,
        }
    }

    /// Object-list entry this row belongs to
    pub fn object_key(&self) -> ObjectKey {
        match self {
            RecordKey::Pa(id, _) => ObjectKey {
                id: *id,
                cluster: None,
            },
            RecordKey::Cluster(id, cluster) => ObjectKey {
                id: *id,
                cluster: Some(cluster.clone()),
            },
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Pa(id, pa) => write!(f, "{} {}", id, pa),
            RecordKey::Cluster(id, cluster) => write!(f, "{} {}", id, cluster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_display_pads_id_and_pa() {
        let key = RecordKey::Pa(ObjectId(5), PositionAngle(10));
        assert_eq!(key.to_string(), "00005 010");
    }

    #[test]
    fn test_record_key_parse_cluster_style() {
        let key = RecordKey::parse(KeyStyle::Cluster, "00042", "A2744").unwrap();
        assert_eq!(key, RecordKey::Cluster(ObjectId(42), ClusterTag::new("A2744")));
        assert_eq!(key.object_key(), ObjectKey::in_cluster(42, "A2744"));
    }

    #[test]
    fn test_record_key_parse_rejects_bad_pa() {
        let result = RecordKey::parse(KeyStyle::PositionAngle, "00042", "abc");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_object_key_ordering_is_by_id_first() {
        let mut keys = vec![ObjectKey::new(47), ObjectKey::new(5), ObjectKey::new(12)];
        keys.sort();
        assert_eq!(keys, vec![ObjectKey::new(5), ObjectKey::new(12), ObjectKey::new(47)]);
    }

    #[test]
    fn test_object_key_display_with_cluster() {
        assert_eq!(ObjectKey::in_cluster(7, "A370").to_string(), "A370_00007");
        assert_eq!(ObjectKey::new(7).to_string(), "00007");
    }
}
