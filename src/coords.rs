use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};
use std::str::FromStr;
use thiserror::Error;

/// A latitude/longitude pair in decimal degrees.
///
/// Range checks live at the input boundary (`validation::validate_course`);
/// values read back from storage are trusted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum PointParseError {
    #[error("point must be wrapped in parentheses: {0:?}")]
    Unwrapped(String),
    #[error("point must have exactly two components: {0:?}")]
    Arity(String),
    #[error("invalid point component {0:?}")]
    Component(String),
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Postgres `point` literal. The point type is (x, y), so longitude goes first.
    pub fn to_point_string(&self) -> String {
        format!("({:.6}, {:.6})", self.longitude, self.latitude)
    }

    pub fn from_point_str(s: &str) -> Result<Self, PointParseError> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| PointParseError::Unwrapped(s.to_string()))?;

        let mut parts = inner.split(',').map(str::trim);
        let (x, y) = match (parts.next(), parts.next(), parts.next()) {
            (Some(x), Some(y), None) => (x, y),
            _ => return Err(PointParseError::Arity(s.to_string())),
        };

        let parse = |c: &str| {
            c.parse::<f64>()
                .map_err(|_| PointParseError::Component(c.to_string()))
        };

        Ok(Self {
            longitude: parse(x)?,
            latitude: parse(y)?,
        })
    }
}

impl FromStr for GeoCoordinate {
    type Err = PointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_point_str(s)
    }
}

// Travels over the wire as point text: bound parameters are cast with
// `::point` and selected columns with `::text`.
impl Type<Postgres> for GeoCoordinate {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

impl<'q> Encode<'q, Postgres> for GeoCoordinate {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <String as Encode<'q, Postgres>>::encode_by_ref(&self.to_point_string(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for GeoCoordinate {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Postgres>>::decode(value)?;
        Ok(Self::from_point_str(text)?)
    }
}
