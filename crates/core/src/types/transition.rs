//! Stock buckets and transition kinds for the inventory state machine.
//!
//! Both enums round-trip through their snake_case string form, which is also
//! how they are stored in the transaction log (plain `text` columns).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing a bucket or transition from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// What was being parsed ("stock bucket" / "transition type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// One of the four quantity counters on a stock record.
///
/// Base items move through all four; combo items only use `Finished` and
/// `Shipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBucket {
    /// Ordered from a supplier, not yet arrived.
    InTransit,
    /// Arrived, not yet packaged into sellable form.
    SemiFinished,
    /// Packaged and ready to ship.
    Finished,
    /// Left the warehouse. Terminal.
    Shipped,
}

impl StockBucket {
    /// The snake_case string form used in the transaction log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InTransit => "in_transit",
            Self::SemiFinished => "semi_finished",
            Self::Finished => "finished",
            Self::Shipped => "shipped",
        }
    }
}

impl core::fmt::Display for StockBucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for StockBucket {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_transit" => Ok(Self::InTransit),
            "semi_finished" => Ok(Self::SemiFinished),
            "finished" => Ok(Self::Finished),
            "shipped" => Ok(Self::Shipped),
            other => Err(ParseEnumError {
                kind: "stock bucket",
                value: other.to_string(),
            }),
        }
    }
}

/// The kind of state transition recorded in the transaction log.
///
/// `Receive` covers both booking quantity in transit and confirming its
/// arrival; the two steps are distinguished by their from/to buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Goods ordered or arrived from a supplier.
    Receive,
    /// Semi-finished goods packaged into finished form, consuming packaging.
    Package,
    /// Finished goods unpacked back to semi-finished, restoring packaging.
    Unpack,
    /// Finished goods shipped out. Irreversible.
    Ship,
    /// Combo assembled from base-item components.
    Assemble,
    /// Combo disassembled back into its components.
    Disassemble,
}

impl TransitionType {
    /// The snake_case string form used in the transaction log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Package => "package",
            Self::Unpack => "unpack",
            Self::Ship => "ship",
            Self::Assemble => "assemble",
            Self::Disassemble => "disassemble",
        }
    }
}

impl core::fmt::Display for TransitionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransitionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receive" => Ok(Self::Receive),
            "package" => Ok(Self::Package),
            "unpack" => Ok(Self::Unpack),
            "ship" => Ok(Self::Ship),
            "assemble" => Ok(Self::Assemble),
            "disassemble" => Ok(Self::Disassemble),
            other => Err(ParseEnumError {
                kind: "transition type",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKETS: [StockBucket; 4] = [
        StockBucket::InTransit,
        StockBucket::SemiFinished,
        StockBucket::Finished,
        StockBucket::Shipped,
    ];

    const TRANSITIONS: [TransitionType; 6] = [
        TransitionType::Receive,
        TransitionType::Package,
        TransitionType::Unpack,
        TransitionType::Ship,
        TransitionType::Assemble,
        TransitionType::Disassemble,
    ];

    #[test]
    fn test_bucket_string_roundtrip() {
        for bucket in BUCKETS {
            assert_eq!(bucket.as_str().parse::<StockBucket>(), Ok(bucket));
        }
    }

    #[test]
    fn test_transition_string_roundtrip() {
        for transition in TRANSITIONS {
            assert_eq!(transition.as_str().parse::<TransitionType>(), Ok(transition));
        }
    }

    #[test]
    fn test_unknown_values_rejected() {
        let err = "melted".parse::<StockBucket>().unwrap_err();
        assert_eq!(err.value, "melted");
        assert!("teleport".parse::<TransitionType>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&StockBucket::SemiFinished).unwrap();
        assert_eq!(json, "\"semi_finished\"");
        let json = serde_json::to_string(&TransitionType::Assemble).unwrap();
        assert_eq!(json, "\"assemble\"");
    }
}
