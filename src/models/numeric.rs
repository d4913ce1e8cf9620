//! Lenient numeric fields
//!
//! Food composition tables arrive with numbers typed as strings ("15",
//! "1,5", "Tr", ""). Anything that does not parse counts as zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64(self) -> f64 {
        match self {
            NumberOrText::Number(n) if n.is_finite() => n,
            NumberOrText::Number(_) => 0.0,
            NumberOrText::Text(s) => parse_number(&s),
        }
    }
}

/// Parse a numeric string, accepting a comma as decimal separator
pub fn parse_number(s: &str) -> f64 {
    let normalized = s.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// `deserialize_with` adapter for an `f64` that may be a string, null or absent
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.map(NumberOrText::into_f64).unwrap_or(0.0))
}

/// `deserialize_with` adapter for an `Option<f64>`; unparseable strings become `None`
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrText::Text(s)) => {
            let normalized = s.trim().replace(',', ".");
            normalized.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    })
}

/// `deserialize_with` adapter for a name -> amount map with lenient values
pub fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<NumberOrText>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.map(NumberOrText::into_f64).unwrap_or(0.0)))
        .collect())
}

/// Like `lenient_map`, but a missing or null map stays `None`
pub fn lenient_opt_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<NumberOrText>>>::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(k, v)| (k, v.map(NumberOrText::into_f64).unwrap_or(0.0)))
            .collect()
    }))
}
