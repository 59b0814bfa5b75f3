use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Identifier generated by the database (BIGSERIAL columns).
///
/// Always serialized as a decimal string: JSON numbers above 2^53 cannot be
/// represented exactly by JavaScript clients. Deserialization accepts a
/// decimal string or a JSON integer.
#[serde_as]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[schema(value_type = String, example = "42")]
pub struct WideId(#[serde_as(as = "PickFirst<(DisplayFromStr, _)>")] i64);

impl WideId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for WideId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<WideId> for i64 {
    fn from(id: WideId) -> Self {
        id.0
    }
}

impl fmt::Display for WideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WideId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
