//! Closed token types used by stored specs.
//!
//! Stored data spells the same thing several ways (`>=` vs `gte`, `AI_NG` vs
//! `NG`, `"None"` for "no operator"). Everything is normalized here, at load
//! time, so evaluation never looks at strings.

use crate::error::SchemaError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison applied between a measured value and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InequalitySign {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl InequalitySign {
    pub const ALL: [InequalitySign; 6] = [
        InequalitySign::Lt,
        InequalitySign::Le,
        InequalitySign::Gt,
        InequalitySign::Ge,
        InequalitySign::Eq,
        InequalitySign::Ne,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            InequalitySign::Lt => "<",
            InequalitySign::Le => "<=",
            InequalitySign::Gt => ">",
            InequalitySign::Ge => ">=",
            InequalitySign::Eq => "==",
            InequalitySign::Ne => "!=",
        }
    }

    /// The sign whose result is always the opposite for finite inputs.
    pub fn negated(self) -> Self {
        match self {
            InequalitySign::Lt => InequalitySign::Ge,
            InequalitySign::Le => InequalitySign::Gt,
            InequalitySign::Gt => InequalitySign::Le,
            InequalitySign::Ge => InequalitySign::Lt,
            InequalitySign::Eq => InequalitySign::Ne,
            InequalitySign::Ne => InequalitySign::Eq,
        }
    }
}

impl FromStr for InequalitySign {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sign = match s.trim().to_ascii_lowercase().as_str() {
            "<" | "lt" => InequalitySign::Lt,
            "<=" | "lte" | "le" => InequalitySign::Le,
            ">" | "gt" => InequalitySign::Gt,
            ">=" | "gte" | "ge" => InequalitySign::Ge,
            "==" | "=" | "eq" => InequalitySign::Eq,
            "!=" | "ne" | "neq" => InequalitySign::Ne,
            _ => return Err(SchemaError::UnknownSign(s.to_string())),
        };
        Ok(sign)
    }
}

impl fmt::Display for InequalitySign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How sibling results combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            _ => Err(SchemaError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Ok,
    Ng,
    Indeterminate,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Ng => "NG",
            Verdict::Indeterminate => "INDETERMINATE",
        }
    }

    /// Matching a defect-confirming range means the instance is a defect.
    pub fn from_match(matched: bool) -> Self {
        if matched { Verdict::Ng } else { Verdict::Ok }
    }
}

impl FromStr for Verdict {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" | "AI_OK" => Ok(Verdict::Ok),
            "NG" | "AI_NG" => Ok(Verdict::Ng),
            "INDETERMINATE" | "UNKNOWN" | "AI_UNKNOWN" | "AI_UNKNOWN_NONE" => {
                Ok(Verdict::Indeterminate)
            }
            _ => Err(SchemaError::UnknownVerdict(s.to_string())),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! string_serde {
    ($ty:ty, $render:expr) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($render(*self))
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(InequalitySign, InequalitySign::symbol);
string_serde!(LogicalOperator, LogicalOperator::as_str);
string_serde!(Verdict, Verdict::as_str);

/// `sub_logical_operator` is stored as `"None"` (or empty / null) on leaves.
pub fn deserialize_optional_operator<'de, D>(
    deserializer: D,
) -> Result<Option<LogicalOperator>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("none") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stored_word_forms_parse() {
        assert_eq!("gte".parse::<InequalitySign>().unwrap(), InequalitySign::Ge);
        assert_eq!("LT".parse::<InequalitySign>().unwrap(), InequalitySign::Lt);
        assert_eq!(" <= ".parse::<InequalitySign>().unwrap(), InequalitySign::Le);
        assert_eq!("eq".parse::<InequalitySign>().unwrap(), InequalitySign::Eq);
        assert_eq!("!=".parse::<InequalitySign>().unwrap(), InequalitySign::Ne);
    }

    #[test]
    fn unknown_sign_is_rejected() {
        let err = "=>".parse::<InequalitySign>().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSign(ref s) if s == "=>"));
    }

    #[test]
    fn verdict_tokens() {
        assert_eq!("AI_NG".parse::<Verdict>().unwrap(), Verdict::Ng);
        assert_eq!("ok".parse::<Verdict>().unwrap(), Verdict::Ok);
        assert_eq!(
            "AI_UNKNOWN_NONE".parse::<Verdict>().unwrap(),
            Verdict::Indeterminate
        );
        assert!("MAYBE".parse::<Verdict>().is_err());
    }

    #[test]
    fn negation_is_an_involution() {
        for sign in InequalitySign::ALL {
            assert_eq!(sign.negated().negated(), sign);
        }
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_optional_operator")]
        op: Option<LogicalOperator>,
    }

    #[test]
    fn none_placeholder_means_no_operator() {
        let h: Holder = serde_json::from_str(r#"{"op": "None"}"#).unwrap();
        assert_eq!(h.op, None);
        let h: Holder = serde_json::from_str(r#"{"op": null}"#).unwrap();
        assert_eq!(h.op, None);
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(h.op, None);
        let h: Holder = serde_json::from_str(r#"{"op": "or"}"#).unwrap();
        assert_eq!(h.op, Some(LogicalOperator::Or));
        assert!(serde_json::from_str::<Holder>(r#"{"op": "XOR"}"#).is_err());
    }
}
