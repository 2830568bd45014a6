use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Surrogate key assigned by the backing store to a dictionary row.
pub trait DimensionId: Copy + Eq + Ord + std::hash::Hash + fmt::Debug + Send + Sync {
    fn from_raw(raw: i64) -> Self;
    fn raw(self) -> i64;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LocationId(pub i64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ParameterId(pub i64);

macro_rules! dimension_id {
    ($name:ident) => {
        impl DimensionId for $name {
            fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            fn raw(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                Ok(Self(i64::deserialize(deserializer)?))
            }
        }
    };
}

dimension_id!(LocationId);
dimension_id!(ParameterId);
