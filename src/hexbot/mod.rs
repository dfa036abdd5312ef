pub mod api;

use serde::Deserialize;
use serde_json::error::Category;

use crate::error::{HexbotError, HexbotResult};

/// Color published when a body cannot be parsed and the variant substitutes.
pub const FALLBACK_HEX: &str = "#000000";

#[derive(Debug, Clone, Deserialize)]
pub struct HexbotResponse {
    pub colors: Vec<ColorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorEntry {
    pub value: String,
}

/// The colors of one API call. Built once, moved through the queue, drawn
/// or printed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorUpdate {
    pub hex: Vec<String>,
}

impl ColorUpdate {
    pub fn new(hex: Vec<String>) -> Self {
        Self { hex }
    }

    pub fn single(hex: impl Into<String>) -> Self {
        Self {
            hex: vec![hex.into()],
        }
    }

    pub fn len(&self) -> usize {
        self.hex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }
}

/// What to do with a body that is not JSON at all. Each program picks one
/// explicitly; they have never agreed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Publish [`FALLBACK_HEX`] in place of the colors.
    Substitute,
    /// Surface [`HexbotError::InvalidJson`].
    Fail,
}

impl FallbackPolicy {
    fn on_invalid_json(self, err: serde_json::Error) -> HexbotResult<Vec<String>> {
        match self {
            FallbackPolicy::Substitute => {
                log::debug!("Substituting {FALLBACK_HEX} for unparseable body: {err}");
                Ok(vec![FALLBACK_HEX.to_string()])
            }
            FallbackPolicy::Fail => Err(HexbotError::InvalidJson(err)),
        }
    }
}

/// Whether a request asks for one color or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Single,
    List,
}

/// Turns raw response bodies into [`ColorUpdate`]s under a fixed policy.
#[derive(Debug, Clone, Copy)]
pub struct UpdateDecoder {
    pub extraction: Extraction,
    pub policy: FallbackPolicy,
}

impl UpdateDecoder {
    pub fn new(extraction: Extraction, policy: FallbackPolicy) -> Self {
        Self { extraction, policy }
    }

    pub fn decode(&self, body: &str) -> HexbotResult<ColorUpdate> {
        match self.extraction {
            Extraction::Single => decode_single_hex(body, self.policy).map(ColorUpdate::single),
            Extraction::List => decode_hex_list(body, self.policy).map(ColorUpdate::new),
        }
    }
}

/// Extracts every `colors[].value` in order.
///
/// Bodies that are not JSON go through `policy`. JSON of the wrong shape
/// (no `colors` array, entries without a string `value`, an empty list) is
/// always a [`HexbotError::MalformedResponse`].
pub fn decode_hex_list(body: &str, policy: FallbackPolicy) -> HexbotResult<Vec<String>> {
    let response = match serde_json::from_str::<HexbotResponse>(body) {
        Ok(response) => response,
        Err(err) => {
            return match err.classify() {
                Category::Data => Err(HexbotError::MalformedResponse(err.to_string())),
                Category::Syntax | Category::Eof | Category::Io => policy.on_invalid_json(err),
            };
        }
    };

    if response.colors.is_empty() {
        return Err(HexbotError::MalformedResponse(
            "`colors` array is empty".to_string(),
        ));
    }

    Ok(response.colors.into_iter().map(|c| c.value).collect())
}

/// Single-color requests: the first value of the list.
pub fn decode_single_hex(body: &str, policy: FallbackPolicy) -> HexbotResult<String> {
    decode_hex_list(body, policy)?
        .into_iter()
        .next()
        .ok_or_else(|| HexbotError::MalformedResponse("`colors` array is empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_list_keeps_order() {
        let body = r##"{"colors":[{"value":"#FF0000"},{"value":"#00FF00"}]}"##;
        let hex = decode_hex_list(body, FallbackPolicy::Fail).unwrap();
        assert_eq!(hex, vec!["#FF0000", "#00FF00"]);
    }

    #[test]
    fn test_decode_single() {
        let body = r##"{"colors":[{"value":"#123ABC"}]}"##;
        assert_eq!(
            decode_single_hex(body, FallbackPolicy::Fail).unwrap(),
            "#123ABC"
        );
    }

    #[test]
    fn test_decode_list_ignores_extra_fields() {
        // The live API sends coordinates alongside the value when asked for them
        let body = r##"{"colors":[{"value":"#0A0B0C","coordinates":{"x":1,"y":2}}],"extra":true}"##;
        let hex = decode_hex_list(body, FallbackPolicy::Fail).unwrap();
        assert_eq!(hex, vec!["#0A0B0C"]);
    }

    #[test]
    fn test_decode_large_list_same_length() {
        let entries: Vec<String> = (0..200)
            .map(|i| format!(r##"{{"value":"#{:06X}"}}"##, i * 4099))
            .collect();
        let body = format!(r#"{{"colors":[{}]}}"#, entries.join(","));

        let hex = decode_hex_list(&body, FallbackPolicy::Substitute).unwrap();
        assert_eq!(hex.len(), 200);
        assert_eq!(hex[0], "#000000");
        assert_eq!(hex[1], format!("#{:06X}", 4099));
        assert_eq!(hex[199], format!("#{:06X}", 199 * 4099));
    }

    #[test]
    fn test_invalid_json_substitutes_exactly_once() {
        // The grid and stream programs keep drawing with black
        for body in ["", "not json", "{\"colors\": [", "<html>502</html>"] {
            let hex = decode_hex_list(body, FallbackPolicy::Substitute).unwrap();
            assert_eq!(hex, vec![FALLBACK_HEX], "body {body:?}");
        }
    }

    #[test]
    fn test_invalid_json_fails_under_fail_policy() {
        // The sequential program gives up instead
        let err = decode_hex_list("not json", FallbackPolicy::Fail).unwrap_err();
        assert!(matches!(err, HexbotError::InvalidJson(_)));

        let err = decode_single_hex("", FallbackPolicy::Fail).unwrap_err();
        assert!(matches!(err, HexbotError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_colors_is_malformed() {
        for body in [
            r#"{}"#,
            r#"{"colours":[]}"#,
            r##"{"colors":"#FFFFFF"}"##,
            r#"{"colors":[{"name":"red"}]}"#,
            r#"{"colors":[{"value":12}]}"#,
            r#"null"#,
            r#"[]"#,
        ] {
            // Never papered over with the fallback color
            let err = decode_hex_list(body, FallbackPolicy::Substitute).unwrap_err();
            assert!(
                matches!(err, HexbotError::MalformedResponse(_)),
                "body {body:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_empty_colors_is_malformed() {
        let err = decode_hex_list(r#"{"colors":[]}"#, FallbackPolicy::Substitute).unwrap_err();
        assert!(matches!(err, HexbotError::MalformedResponse(_)));

        let err = decode_single_hex(r#"{"colors":[]}"#, FallbackPolicy::Fail).unwrap_err();
        assert!(matches!(err, HexbotError::MalformedResponse(_)));
    }

    #[test]
    fn test_update_decoder_modes() {
        let body = r##"{"colors":[{"value":"#111111"},{"value":"#222222"}]}"##;

        let single = UpdateDecoder::new(Extraction::Single, FallbackPolicy::Substitute);
        assert_eq!(single.decode(body).unwrap(), ColorUpdate::single("#111111"));

        let list = UpdateDecoder::new(Extraction::List, FallbackPolicy::Substitute);
        let update = list.decode(body).unwrap();
        assert_eq!(update.len(), 2);
        assert!(!update.is_empty());

        let update = list.decode("garbage").unwrap();
        assert_eq!(update, ColorUpdate::single(FALLBACK_HEX));
    }
}
