//! Tagged statistic values

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Marker used when serializing an undefined statistic
pub const UNDEFINED_MARKER: &str = "undefined";

/// A statistic that is either a finite number or explicitly undefined
///
/// Degenerate inputs (zero variance, too few paired samples) produce
/// `Undefined` rather than NaN or zero, so consumers cannot mistake a missing
/// correlation for no correlation. Serializes as a number or the string
/// `"undefined"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Statistic {
    Defined(f64),
    #[default]
    Undefined,
}

impl Statistic {
    /// Wrap a raw value; NaN and infinities become `Undefined`
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Statistic::Defined(value)
        } else {
            Statistic::Undefined
        }
    }

    /// The value, if defined
    pub fn value(&self) -> Option<f64> {
        match *self {
            Statistic::Defined(v) => Some(v),
            Statistic::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Statistic::Defined(_))
    }

    pub fn is_undefined(&self) -> bool {
        !self.is_defined()
    }

    /// Apply `f` to a defined value
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Statistic::Defined(v) => Statistic::from_value(f(v)),
            Statistic::Undefined => Statistic::Undefined,
        }
    }
}

impl From<Option<f64>> for Statistic {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Statistic::Undefined, Statistic::from_value)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Statistic::Undefined => f.write_str(UNDEFINED_MARKER),
        }
    }
}

impl Serialize for Statistic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Statistic::Defined(v) => serializer.serialize_f64(v),
            Statistic::Undefined => serializer.serialize_str(UNDEFINED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Statistic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Marker(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Statistic::from_value(v)),
            Repr::Marker(s) if s == UNDEFINED_MARKER => Ok(Statistic::Undefined),
            Repr::Marker(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{}\", got \"{}\"",
                UNDEFINED_MARKER, s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value() {
        assert_eq!(Statistic::from_value(0.5), Statistic::Defined(0.5));
        assert_eq!(Statistic::from_value(f64::NAN), Statistic::Undefined);
        assert_eq!(Statistic::from_value(f64::INFINITY), Statistic::Undefined);
        assert_eq!(Statistic::from(None), Statistic::Undefined);
    }

    #[test]
    fn test_undefined_is_not_zero() {
        let s = Statistic::Undefined;
        assert_eq!(s.value(), None);
        assert_ne!(s, Statistic::Defined(0.0));
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&Statistic::Defined(0.25)).unwrap(), "0.25");
        assert_eq!(serde_json::to_string(&Statistic::Undefined).unwrap(), "\"undefined\"");

        let back: Statistic = serde_json::from_str("\"undefined\"").unwrap();
        assert_eq!(back, Statistic::Undefined);
        let back: Statistic = serde_json::from_str("-0.5").unwrap();
        assert_eq!(back, Statistic::Defined(-0.5));
        assert!(serde_json::from_str::<Statistic>("\"zero\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:.2}", Statistic::Defined(0.12345)), "0.12");
        assert_eq!(format!("{}", Statistic::Undefined), "undefined");
    }
}
