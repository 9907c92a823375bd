// Decoder for the upstream's delimited text responses.
//
// Records look like `1:128:2:Stereo Madness:3:...`, optionally followed by
// `#`-separated auxiliary sections. Some private servers prepend PHP warning
// banners (plain text or HTML) before the payload; those are stripped here.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_FIELD_SEPARATOR: &str = ":";
pub const DEFAULT_RECORD_SEPARATOR: &str = "|";
const SENTINEL_FAILURE: &str = "-1";
const SECTION_SEPARATOR: char = '#';
const TEXT_WARNING_PREFIX: &str = "\nWarning:";
const HTML_BREAK: &str = "<br />";

// Sparse field map. A key mapped to `None` was named by the upstream without
// a value (odd trailing field), which is different from a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedResponse {
    fields: BTreeMap<String, Option<String>>,
}

impl DecodedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }

    // Distinguishes the three states: missing (None), named without a
    // value (Some(None)) and present (Some(Some(..))).
    pub fn raw(&self, key: &str) -> Option<Option<&str>> {
        self.fields.get(key).map(|v| v.as_deref())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_i64(key).map(|v| v != 0)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.fields.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl Serialize for DecodedResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub fn is_sentinel(body: &str) -> bool {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return true;
    }
    let bytes = trimmed.as_bytes();
    bytes.len() == 2 && bytes[0] == b'-' && bytes[1].is_ascii_digit()
}

fn strip_banners(body: &str) -> String {
    let mut text = body.to_string();

    if text.starts_with(TEXT_WARNING_PREFIX) {
        // Leading newline, then the warning line and the line after it.
        text = text[1..]
            .split('\n')
            .skip(2)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
    }

    if text.starts_with(HTML_BREAK) {
        text = text
            .split(HTML_BREAK)
            .skip(2)
            .collect::<Vec<_>>()
            .join(HTML_BREAK)
            .trim()
            .to_string();
    }

    text
}

fn primary_section(text: &str) -> &str {
    text.split(SECTION_SEPARATOR).next().unwrap_or_default()
}

fn pair_fields(record: &str, separator: &str) -> DecodedResponse {
    let mut decoded = DecodedResponse::new();
    if separator.is_empty() {
        decoded.insert(record, None);
        return decoded;
    }

    let mut parts = record.split(separator);
    while let Some(key) = parts.next() {
        decoded.insert(key, parts.next().map(str::to_string));
    }
    decoded
}

pub fn decode(body: &str, separator: &str) -> DecodedResponse {
    if body.is_empty() || body == SENTINEL_FAILURE {
        return DecodedResponse::new();
    }

    let text = strip_banners(body);
    pair_fields(primary_section(&text), separator)
}

pub fn decode_default(body: &str) -> DecodedResponse {
    decode(body, DEFAULT_FIELD_SEPARATOR)
}

pub fn decode_list(
    body: &str,
    record_separator: &str,
    field_separator: &str,
) -> Vec<DecodedResponse> {
    if body.is_empty() || body == SENTINEL_FAILURE || record_separator.is_empty() {
        return Vec::new();
    }

    let text = strip_banners(body);
    primary_section(&text)
        .split(record_separator)
        .filter(|record| !record.trim().is_empty())
        .map(|record| pair_fields(record, field_separator))
        .collect()
}

pub fn sections(body: &str) -> Vec<String> {
    if body.is_empty() || body == SENTINEL_FAILURE {
        return Vec::new();
    }
    strip_banners(body)
        .split(SECTION_SEPARATOR)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(decoded: &DecodedResponse) -> Vec<(String, Option<String>)> {
        decoded
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn sentinel_and_empty_bodies_decode_to_nothing() {
        assert!(decode_default("").is_empty());
        assert!(decode_default("-1").is_empty());
    }

    #[test]
    fn simple_record_pairs_keys_and_values() {
        let decoded = decode_default("1:128:2:Stereo Madness:3:");
        assert_eq!(decoded.get("1"), Some("128"));
        assert_eq!(decoded.get("2"), Some("Stereo Madness"));
        assert_eq!(decoded.raw("3"), Some(Some("")));
        assert_eq!(decoded.raw("4"), None);
        assert_eq!(decoded.get_i64("1"), Some(128));
    }

    #[test]
    fn text_warning_banner_is_stripped() {
        let decoded = decode_default("\nWarning: foo\nbar\n1:2");
        assert_eq!(pairs(&decoded), vec![("1".into(), Some("2".into()))]);
    }

    #[test]
    fn html_warning_banner_is_stripped() {
        let body = "<br />\n<b>Warning</b>:  Undefined index in <b>/var/www/x.php</b><br />\n1:5:2:name";
        let decoded = decode_default(body);
        assert_eq!(decoded.get("1"), Some("5"));
        assert_eq!(decoded.get("2"), Some("name"));
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn auxiliary_sections_are_ignored() {
        let decoded = decode_default("1:2#garbage");
        assert_eq!(pairs(&decoded), vec![("1".into(), Some("2".into()))]);
    }

    #[test]
    fn odd_field_count_leaves_last_key_without_value() {
        let decoded = decode_default("1:2:3");
        assert_eq!(decoded.get("1"), Some("2"));
        assert!(decoded.contains_key("3"));
        assert_eq!(decoded.raw("3"), Some(None));
        assert_eq!(decoded.get("3"), None);
    }

    #[test]
    fn repeated_keys_keep_last_value() {
        let decoded = decode_default("1:a:1:b");
        assert_eq!(decoded.get("1"), Some("b"));
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn custom_separator_is_honoured() {
        let decoded = decode("1~|~42~|~2~|~Viprin", "~|~");
        assert_eq!(decoded.get("1"), Some("42"));
        assert_eq!(decoded.get("2"), Some("Viprin"));
    }

    #[test]
    fn decoder_is_total_over_adversarial_input() {
        let inputs = [
            "",
            "-1",
            ":",
            "::::",
            "   ",
            "#",
            "##:#",
            "\n",
            "\nWarning:",
            "\nWarning:\n",
            "<br />",
            "<br /><br />",
            "\u{0}\u{ffff}:🎮",
            "1:2:3:4:5",
        ];
        for input in inputs {
            let _ = decode_default(input);
            let _ = decode(input, "");
            let _ = decode_list(input, "|", ":");
            let _ = sections(input);
        }
        assert_eq!(pairs(&decode_default(":")), vec![("".into(), Some("".into()))]);
        assert!(decode_default("\nWarning:").get("").is_none());
    }

    #[test]
    fn list_decoding_splits_records_and_skips_blanks() {
        let body = "1:1:2:A|1:2:2:B||#10:0:10";
        let records = decode_list(body, DEFAULT_RECORD_SEPARATOR, DEFAULT_FIELD_SEPARATOR);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("2"), Some("B"));
    }

    #[test]
    fn sections_expose_paging_info() {
        let parts = sections("1:1|1:2#1:Viprin:3#9999:0:10");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "9999:0:10");
        assert!(sections("-1").is_empty());
    }

    #[test]
    fn sentinel_detection() {
        assert!(is_sentinel("-1"));
        assert!(is_sentinel("-2\n"));
        assert!(is_sentinel(""));
        assert!(!is_sentinel("-10"));
        assert!(!is_sentinel("1:2"));
    }

    #[test]
    fn serializes_absent_values_as_null() {
        let json = serde_json::to_value(decode_default("1:2:3")).unwrap();
        assert_eq!(json, serde_json::json!({"1": "2", "3": null}));
    }
}
