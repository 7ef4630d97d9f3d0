//! Embedded payload extraction
//!
//! Sites embed the data this crate is after in one of three conventions:
//! inline `<script type="application/json">` tags, a season-list container of
//! option elements, or a JSONP callback wrapper around a JSON body. The
//! extractor tries the three strategies in order and returns the first match
//! as a self-contained `{ "<variable>": <value> }` document.
//!
//! "Not found" is an ordinary outcome here, distinct from an error: a
//! document that was fetched successfully but does not contain the requested
//! variable yields `None`, and retrying the network call will not make the
//! document contain different data.

use rand::Rng;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::{callback, selectors};
use crate::errors::ExtractError;

/// Which embedded value to extract, and for JSONP-wrapped bodies, the
/// callback token used to locate and strip the wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSpec {
    /// Name of the embedded variable
    pub variable: String,
    /// JSONP callback identifier, if the endpoint wraps its response
    pub callback: Option<String>,
}

impl ExtractionSpec {
    /// Extract `variable` from inline scripts or the season list
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            callback: None,
        }
    }

    /// Extract `variable`, unwrapping a `callback(...)` JSONP wrapper if the
    /// first two strategies find nothing
    pub fn with_callback(variable: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            callback: Some(callback.into()),
        }
    }
}

/// Per-variable unwrap rules for JSONP payloads
///
/// Each entry maps a variable name to the field path where its value lives
/// inside the parsed callback body. Add an entry per new embedding
/// convention rather than branching ad hoc.
const UNWRAP_RULES: &[(&str, &[&str])] = &[
    ("allMatches", &["match"]),
    ("allEvents", &["liveData", "event"]),
];

/// Locates a named payload inside an HTML or JSONP document
#[derive(Debug, Clone)]
pub struct Extractor {
    embedded_json: Selector,
    season_options: Selector,
}

impl Extractor {
    /// Build an extractor with the configured selectors
    ///
    /// # Errors
    ///
    /// Returns `ExtractError` if a selector constant fails to parse.
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            embedded_json: parse_selector(selectors::EMBEDDED_JSON_SELECTOR)?,
            season_options: parse_selector(selectors::SEASON_LIST_SELECTOR)?,
        })
    }

    /// Extract the value named by `spec` from `body`
    ///
    /// Returns `Some({ "<variable>": <value> })` on a match, `None` when the
    /// document does not contain the requested data. Malformed inline script
    /// bodies are skipped; a malformed JSONP remainder is logged and yields
    /// `None`.
    pub fn extract(&self, body: &str, spec: &ExtractionSpec) -> Option<Value> {
        let document = Html::parse_document(body);
        let mut data = Map::new();

        for script in document.select(&self.embedded_json) {
            let text: String = script.text().collect();
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(object)) if object.contains_key(&spec.variable) => {
                    data.extend(object);
                }
                // Malformed or unrelated script bodies are skipped
                _ => {}
            }
        }

        if !data.contains_key(&spec.variable) {
            let seasons: Vec<Value> = document
                .select(&self.season_options)
                .map(|option| {
                    Value::String(option.value().attr("value").unwrap_or_default().to_string())
                })
                .collect();

            if !seasons.is_empty() {
                debug!("Found {} season options for '{}'", seasons.len(), spec.variable);
                data.insert(spec.variable.clone(), Value::Array(seasons));
            } else if let Some(value) = self.unwrap_jsonp(&document, spec) {
                data.insert(spec.variable.clone(), value);
            }
        }

        let value = data.remove(&spec.variable)?;
        let mut result = Map::new();
        result.insert(spec.variable.clone(), value);
        Some(Value::Object(result))
    }

    /// Strategy 3: strip the `callback(...)` wrapper from the document text
    /// and pull the variable's value out via the unwrap-rule table
    fn unwrap_jsonp(&self, document: &Html, spec: &ExtractionSpec) -> Option<Value> {
        let callback = spec.callback.as_deref()?;
        let text: String = document.root_element().text().collect();

        let marker = format!("{callback}(");
        let remainder = match text.split_once(&marker) {
            Some((_, after)) => after,
            None => "",
        };
        let remainder = remainder.trim_end();
        let remainder = remainder.strip_suffix(')').unwrap_or(remainder);

        let parsed: Value = match serde_json::from_str(remainder) {
            Ok(value) => value,
            Err(err) => {
                warn!("Could not parse response as the expected embedded format: {err}");
                return None;
            }
        };

        let (_, path) = UNWRAP_RULES
            .iter()
            .find(|(name, _)| *name == spec.variable)?;
        let mut value = &parsed;
        for key in *path {
            value = value.get(key)?;
        }
        Some(value.clone())
    }
}

/// Generate a fresh JSONP callback identifier
///
/// A fixed two-character prefix followed by 40 lowercase hexadecimal
/// characters, generated per request to avoid collisions with a shared
/// endpoint across concurrent unrelated sessions.
pub fn generate_callback_id() -> String {
    const CHARSET: &[u8] = b"abcdef0123456789";
    let mut rng = rand::thread_rng();
    let hex: String = (0..callback::CALLBACK_HEX_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", callback::CALLBACK_PREFIX, hex)
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector {
        selector: selector.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn extractor() -> Extractor {
        Extractor::new().unwrap()
    }

    #[test]
    fn inline_script_scan_finds_variable() {
        let body = r#"<html><body>
            <script type="application/json">{"allAvailableSeasons": ["2021/2022","2022/2023"]}</script>
        </body></html>"#;
        let spec = ExtractionSpec::new("allAvailableSeasons");

        let result = extractor().extract(body, &spec).unwrap();
        assert_eq!(
            result,
            json!({ "allAvailableSeasons": ["2021/2022", "2022/2023"] })
        );
    }

    #[test]
    fn malformed_script_bodies_are_skipped() {
        let body = r#"<html><body>
            <script type="application/json">{not json at all</script>
            <script type="application/json">{"allAvailableSeasons": ["a"]}</script>
        </body></html>"#;
        let spec = ExtractionSpec::new("allAvailableSeasons");

        let result = extractor().extract(body, &spec).unwrap();
        assert_eq!(result, json!({ "allAvailableSeasons": ["a"] }));
    }

    #[test]
    fn scripts_without_the_variable_are_ignored() {
        let body = r#"<html><body>
            <script type="application/json">{"somethingElse": 1}</script>
        </body></html>"#;
        let spec = ExtractionSpec::new("allAvailableSeasons");

        assert!(extractor().extract(body, &spec).is_none());
    }

    #[test]
    fn season_list_fallback_collects_option_values() {
        let body = r#"<html><body>
            <div id="seasonlist">
                <option value="a">2021/2022</option>
                <option value="b">2022/2023</option>
            </div>
        </body></html>"#;
        let spec = ExtractionSpec::new("allAvailableSeasons");

        let result = extractor().extract(body, &spec).unwrap();
        assert_eq!(result, json!({ "allAvailableSeasons": ["a", "b"] }));
    }

    #[test]
    fn jsonp_unwrap_applies_match_rule() {
        let body = r#"...prefixWZabc123({"match":[{"id":1}]})"#;
        let spec = ExtractionSpec::with_callback("allMatches", "WZabc123");

        let result = extractor().extract(body, &spec).unwrap();
        assert_eq!(result, json!({ "allMatches": [{"id": 1}] }));
    }

    #[test]
    fn jsonp_unwrap_applies_nested_event_rule() {
        let body = r#"W3cafe({"liveData":{"event":[{"typeId":7}]}})"#;
        let spec = ExtractionSpec::with_callback("allEvents", "W3cafe");

        let result = extractor().extract(body, &spec).unwrap();
        assert_eq!(result, json!({ "allEvents": [{"typeId": 7}] }));
    }

    #[test]
    fn malformed_jsonp_body_yields_no_result() {
        let body = "WZabc123({this is not json)";
        let spec = ExtractionSpec::with_callback("allMatches", "WZabc123");

        assert!(extractor().extract(body, &spec).is_none());
    }

    #[test]
    fn jsonp_without_unwrap_rule_yields_no_result() {
        let body = r#"WZabc123({"match":[{"id":1}]})"#;
        let spec = ExtractionSpec::with_callback("unknownVariable", "WZabc123");

        assert!(extractor().extract(body, &spec).is_none());
    }

    #[test]
    fn callback_id_has_prefix_and_forty_hex_chars() {
        let id = generate_callback_id();
        assert_eq!(id.len(), 42);
        assert!(id.starts_with("W3"));
        assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn callback_ids_differ_per_request() {
        assert_ne!(generate_callback_id(), generate_callback_id());
    }
}
