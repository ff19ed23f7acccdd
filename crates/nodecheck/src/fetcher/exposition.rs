//! Parser for the Prometheus text exposition format.
//!
//! Only sample lines matter here; `# HELP` / `# TYPE` comments are ignored.
//! A malformed line is skipped on its own and counted, it never fails the
//! whole scrape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A metric name plus its (sorted) label set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricKey {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_series(f, &self.name, &self.labels)
    }
}

/// Parsed metrics scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsData {
    pub samples: BTreeMap<MetricKey, f64>,
    /// Lines that could not be parsed and were dropped
    pub skipped_lines: usize,
}

impl MetricsData {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Values of every series matched by `selector`.
    pub fn matching<'a>(&'a self, selector: &'a MetricSelector) -> impl Iterator<Item = f64> + 'a {
        self.samples
            .iter()
            .filter(move |(key, _)| selector.matches(key))
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, selector: &MetricSelector) -> bool {
        self.matching(selector).next().is_some()
    }

    /// Sum of all matched series, `None` when nothing matched.
    pub fn sum(&self, selector: &MetricSelector) -> Option<f64> {
        self.matching(selector).fold(None, |total, value| Some(total.unwrap_or(0.0) + value))
    }
}

/// Selects series by name and a subset of labels: `name` or `name{label="value",...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetricSelector {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl MetricSelector {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (name, labels, rest) = parse_series(raw.trim())?;
        if !rest.trim().is_empty() {
            return Err(format!("unexpected trailing input {rest:?}"));
        }
        Ok(Self { name, labels })
    }

    pub fn matches(&self, key: &MetricKey) -> bool {
        key.name == self.name
            && self.labels.iter().all(|(label, value)| key.labels.get(label) == Some(value))
    }
}

impl TryFrom<String> for MetricSelector {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<MetricSelector> for String {
    fn from(selector: MetricSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_series(f, &self.name, &self.labels)
    }
}

fn write_series(f: &mut fmt::Formatter<'_>, name: &str, labels: &BTreeMap<String, String>) -> fmt::Result {
    write!(f, "{name}")?;
    if labels.is_empty() {
        return Ok(());
    }
    let rendered: Vec<String> = labels
        .iter()
        .map(|(label, value)| format!("{label}=\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    write!(f, "{{{}}}", rendered.join(","))
}

/// Parse a whole exposition document.
pub fn parse_exposition(text: &str) -> MetricsData {
    let mut data = MetricsData::default();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_sample(line) {
            Ok((key, value)) => {
                data.samples.insert(key, value);
            }
            Err(reason) => {
                debug!("Skipping metrics line {}: {}", number + 1, reason);
                data.skipped_lines += 1;
            }
        }
    }

    data
}

/// Parse one `name{labels} value [timestamp]` line.
pub fn parse_sample(line: &str) -> Result<(MetricKey, f64), String> {
    let (name, labels, rest) = parse_series(line)?;

    let mut fields = rest.split_whitespace();
    let value = fields.next().ok_or("missing sample value")?;
    let value = parse_value(value)?;

    if let Some(timestamp) = fields.next() {
        timestamp
            .parse::<i64>()
            .map_err(|_| format!("invalid timestamp {timestamp:?}"))?;
    }
    if fields.next().is_some() {
        return Err("unexpected trailing fields".to_string());
    }

    Ok((MetricKey { name, labels }, value))
}

fn parse_value(raw: &str) -> Result<f64, String> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => raw.parse::<f64>().map_err(|_| format!("invalid sample value {raw:?}")),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

/// Parse a series name with optional label block, returning what follows it.
fn parse_series(input: &str) -> Result<(String, BTreeMap<String, String>, &str), String> {
    let end = input.find(|c: char| !is_name_char(c)).unwrap_or(input.len());
    let name = &input[..end];

    if !name.starts_with(is_name_start) {
        return Err(format!("invalid metric name in {input:?}"));
    }

    let rest = &input[end..];
    match rest.strip_prefix('{') {
        Some(label_block) => {
            let (labels, rest) = parse_labels(label_block)?;
            Ok((name.to_string(), labels, rest))
        }
        None => Ok((name.to_string(), BTreeMap::new(), rest)),
    }
}

/// Parse `label="value",...}` (the opening brace already consumed).
fn parse_labels(input: &str) -> Result<(BTreeMap<String, String>, &str), String> {
    let mut labels = BTreeMap::new();
    let mut rest = input.trim_start();

    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let eq = rest.find('=').ok_or("label without value")?;
        let label = rest[..eq].trim();
        if !label.starts_with(is_name_start) || !label.chars().all(is_name_char) {
            return Err(format!("invalid label name {label:?}"));
        }

        let after_eq = rest[eq + 1..].trim_start();
        let quoted = after_eq.strip_prefix('"').ok_or("label value is not quoted")?;
        let (value, after_value) = parse_quoted(quoted)?;
        labels.insert(label.to_string(), value);

        rest = after_value.trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        } else if !rest.starts_with('}') {
            return Err("expected ',' or '}' after label".to_string());
        }
    }
}

/// Read an escaped string up to its closing quote.
fn parse_quoted(input: &str) -> Result<(String, &str), String> {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &input[index + 1..])),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            _ => value.push(c),
        }
    }

    Err("unterminated label value".to_string())
}
