use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One named reading. `value: None` means "not measured", which is not zero.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MeasurementValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
}

impl MeasurementValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Readings for one inference result, indexed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementBag {
    values: BTreeMap<String, Option<f64>>,
}

impl MeasurementBag {
    /// Index readings by name. Repeated names are an error when `strict`,
    /// otherwise the last one wins.
    pub fn from_values(
        values: impl IntoIterator<Item = MeasurementValue>,
        strict: bool,
    ) -> Result<Self, SchemaError> {
        let mut out = BTreeMap::new();
        for mv in values {
            if let Some(prev) = out.insert(mv.name.clone(), mv.value) {
                if strict {
                    return Err(SchemaError::DuplicateMeasurement(mv.name));
                }
                warn!(name = %mv.name, ?prev, new = ?mv.value, "measurement given twice, keeping the last");
            }
        }
        Ok(Self { values: out })
    }

    pub fn insert(&mut self, mv: MeasurementValue) {
        self.values.insert(mv.name, mv.value);
    }

    /// The reading for `name`, if one was taken.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    /// True when no entry carries a value.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<MeasurementValue> for MeasurementBag {
    fn from_iter<I: IntoIterator<Item = MeasurementValue>>(iter: I) -> Self {
        let mut bag = MeasurementBag::default();
        for mv in iter {
            bag.insert(mv);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn absent_is_not_zero() {
        let bag: MeasurementBag = [
            MeasurementValue::new("area", 0.0),
            MeasurementValue::absent("longest"),
        ]
        .into_iter()
        .collect();
        assert_eq!(bag.get("area"), Some(0.0));
        assert_eq!(bag.get("longest"), None);
        assert_eq!(bag.get("gray"), None);
        assert!(!bag.is_empty());
    }

    #[test]
    fn only_absent_entries_count_as_empty() {
        let bag: MeasurementBag = [MeasurementValue::absent("area")].into_iter().collect();
        assert!(bag.is_empty());
        assert_eq!(bag.len(), 1);
        assert!(MeasurementBag::default().is_empty());
    }

    #[test]
    fn duplicates() {
        let values = vec![
            MeasurementValue::new("area", 1.0),
            MeasurementValue::new("area", 2.0),
        ];
        let bag = MeasurementBag::from_values(values.clone(), false).unwrap();
        assert_eq!(bag.get("area"), Some(2.0));

        let err = MeasurementBag::from_values(values, true).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateMeasurement(ref n) if n == "area"));
    }

    #[test]
    fn json_value_may_be_null_or_missing() {
        let values: Vec<MeasurementValue> =
            serde_json::from_str(r#"[{"name":"a","value":null},{"name":"b"},{"name":"c","value":7.5}]"#)
                .unwrap();
        let bag = MeasurementBag::from_values(values, true).unwrap();
        assert_eq!(bag.get("a"), None);
        assert_eq!(bag.get("b"), None);
        assert_eq!(bag.get("c"), Some(7.5));
    }
}
