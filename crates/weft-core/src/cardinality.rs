//! Cardinality (multiplicity) pairs for relationship ends.
//!
//! A [`Cardinality`] is a `(minimum, maximum)` pair where the maximum is
//! either a bounded non-negative integer or [`CardinalityBound::Unbounded`].
//! An *unset* cardinality is a different state from an explicitly unbounded
//! one; callers model "unset" as `Option<Cardinality>::None`.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when constructing or parsing a [`Cardinality`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardinalityError {
    #[error("invalid cardinality range: minimum {minimum} exceeds maximum {maximum}")]
    InvalidRange { minimum: u32, maximum: u32 },

    #[error("invalid cardinality `{0}`, expected forms like `0..1` or `1..*`")]
    Parse(String),
}

/// Upper bound of a cardinality pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityBound {
    /// A concrete non-negative upper bound.
    Bounded(u32),
    /// Explicitly unbounded (`*`).
    Unbounded,
}

impl Display for CardinalityBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardinalityBound::Bounded(value) => write!(f, "{value}"),
            CardinalityBound::Unbounded => write!(f, "*"),
        }
    }
}

/// A validated `(minimum, maximum)` multiplicity pair.
///
/// # Examples
///
/// ```
/// use weft_core::cardinality::{Cardinality, CardinalityBound};
///
/// let optional = Cardinality::new(0, CardinalityBound::Bounded(1)).unwrap();
/// let many = Cardinality::new(1, CardinalityBound::Unbounded).unwrap();
///
/// assert_eq!(optional.to_string(), "0..1");
/// assert_eq!(many.to_string(), "1..*");
/// assert!(Cardinality::new(2, CardinalityBound::Bounded(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    minimum: u32,
    maximum: CardinalityBound,
}

impl Cardinality {
    /// Creates a cardinality, rejecting pairs where a bounded maximum is
    /// smaller than the minimum.
    pub fn new(minimum: u32, maximum: CardinalityBound) -> Result<Self, CardinalityError> {
        if let CardinalityBound::Bounded(max) = maximum {
            if minimum > max {
                return Err(CardinalityError::InvalidRange {
                    minimum,
                    maximum: max,
                });
            }
        }
        Ok(Self { minimum, maximum })
    }

    /// Returns the minimum of the pair.
    pub fn minimum(&self) -> u32 {
        self.minimum
    }

    /// Returns the maximum of the pair.
    pub fn maximum(&self) -> CardinalityBound {
        self.maximum
    }

    /// Returns `true` when `count` satisfies this cardinality.
    pub fn admits(&self, count: u32) -> bool {
        if count < self.minimum {
            return false;
        }
        match self.maximum {
            CardinalityBound::Bounded(max) => count <= max,
            CardinalityBound::Unbounded => true,
        }
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.minimum, self.maximum)
    }
}

impl FromStr for Cardinality {
    type Err = CardinalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minimum, maximum) = s
            .split_once("..")
            .ok_or_else(|| CardinalityError::Parse(s.to_owned()))?;
        let minimum: u32 = minimum
            .parse()
            .map_err(|_| CardinalityError::Parse(s.to_owned()))?;
        let maximum = if maximum == "*" {
            CardinalityBound::Unbounded
        } else {
            let max: u32 = maximum
                .parse()
                .map_err(|_| CardinalityError::Parse(s.to_owned()))?;
            CardinalityBound::Bounded(max)
        };
        Self::new(minimum, maximum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_inverted_range() {
        let result = Cardinality::new(3, CardinalityBound::Bounded(1));
        assert_eq!(
            result,
            Err(CardinalityError::InvalidRange {
                minimum: 3,
                maximum: 1
            })
        );
    }

    #[test]
    fn test_unbounded_accepts_any_minimum() {
        let cardinality = Cardinality::new(u32::MAX, CardinalityBound::Unbounded).unwrap();
        assert_eq!(cardinality.minimum(), u32::MAX);
    }

    #[test]
    fn test_admits() {
        let cardinality = Cardinality::new(1, CardinalityBound::Bounded(2)).unwrap();
        assert!(!cardinality.admits(0));
        assert!(cardinality.admits(1));
        assert!(cardinality.admits(2));
        assert!(!cardinality.admits(3));
    }

    #[test]
    fn test_parse_and_display() {
        let optional: Cardinality = "0..1".parse().unwrap();
        assert_eq!(optional.to_string(), "0..1");

        let many: Cardinality = "0..*".parse().unwrap();
        assert_eq!(many.maximum(), CardinalityBound::Unbounded);

        assert!("1".parse::<Cardinality>().is_err());
        assert!("a..b".parse::<Cardinality>().is_err());
        assert!("2..1".parse::<Cardinality>().is_err());
    }

    proptest! {
        /// Construction succeeds exactly when minimum <= maximum (or the
        /// maximum is unbounded), and display/parse round-trips.
        #[test]
        fn prop_validity_and_round_trip(minimum in 0u32..100, maximum in proptest::option::of(0u32..100)) {
            let bound = match maximum {
                Some(max) => CardinalityBound::Bounded(max),
                None => CardinalityBound::Unbounded,
            };
            let result = Cardinality::new(minimum, bound);
            match maximum {
                Some(max) if minimum > max => prop_assert!(result.is_err()),
                _ => {
                    let cardinality = result.unwrap();
                    let round_tripped: Cardinality = cardinality.to_string().parse().unwrap();
                    prop_assert_eq!(round_tripped, cardinality);
                }
            }
        }
    }
}
