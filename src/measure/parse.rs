use crate::error::SchemaError;
use crate::measure::bag::MeasurementValue;
use regex::Regex;
use std::fs;
use std::sync::OnceLock;

/// Tokens that mark a reading as not taken.
const ABSENT: [&str; 5] = ["-", "na", "n/a", "none", "null"];

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1) name: no whitespace, no '='
    // 2) value: anything up to trailing whitespace
    RE.get_or_init(|| Regex::new(r"^\s*([^\s=#]+)\s*(?:=|\s)\s*(\S+)\s*$").expect("valid regex"))
}

fn parse_value(raw: &str) -> Result<Option<f64>, String> {
    if ABSENT.iter().any(|a| raw.eq_ignore_ascii_case(a)) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| format!("bad value {:?}: {}", raw, e))
}

/// Parse measurement readings, one per line.
///
/// Expected columns (whitespace-separated, or `name=value`):
/// name  value
///
/// Example:
/// longest   7.5
/// area      -        # not measured
/// gray=112
pub fn parse_measurement_text(text: &str, origin: &str) -> Result<Vec<MeasurementValue>, SchemaError> {
    let re = line_re();

    let mut out = Vec::new();
    let mut first = true;
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };

        if line.trim().is_empty() {
            continue;
        }

        // Skip header line if present: the first line with content.
        if first {
            first = false;
            if line.split_whitespace().eq(["name", "value"]) {
                continue;
            }
        }

        let caps = re.captures(line).ok_or_else(|| SchemaError::Measurement {
            location: format!("{}:{}", origin, lno),
            message: format!("cannot parse line: {:?}", line.trim()),
        })?;

        let name = caps[1].to_string();
        let value = parse_value(&caps[2]).map_err(|message| SchemaError::Measurement {
            location: format!("{}:{}", origin, lno),
            message,
        })?;

        out.push(MeasurementValue { name, value });
    }

    Ok(out)
}

pub fn parse_measurement_file(path: &str) -> Result<Vec<MeasurementValue>, SchemaError> {
    let text = fs::read_to_string(path)?;
    parse_measurement_text(&text, path)
}

/// Parse "longest=7.5" (or "longest=-" for an absent reading).
pub fn parse_assignment(s: &str) -> Result<MeasurementValue, SchemaError> {
    let bad = |message: String| SchemaError::Measurement {
        location: format!("{:?}", s),
        message,
    };
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| bad("expected NAME=VALUE".to_string()))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(bad(format!("bad measurement name {:?}", name)));
    }
    Ok(MeasurementValue {
        name: name.to_string(),
        value: parse_value(value.trim()).map_err(bad)?,
    })
}
