//! Normalization of backend output to plain text.
//!
//! Backends do not agree on a return shape: the ONNX engine produces a decoded
//! hypothesis, while an external command may print an object with a `text`
//! field, a list of candidates, or something else entirely. [`ModelOutput`]
//! names those shapes and [`ModelOutput::into_text`] collapses them in a fixed
//! priority order: text field, then first element, then string coercion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded recognition hypothesis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hypothesis {
    /// Decoded transcript.
    pub text: String,
    /// Emitted token IDs, after blank removal and repeat collapsing.
    pub token_ids: Vec<usize>,
    /// Sum of per-frame log-probabilities along the greedy path, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Hypothesis {
    /// Hypothesis carrying only text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// What a backend handed back for one input file.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelOutput {
    /// A record with a text field.
    Hypothesis(Hypothesis),
    /// A sequence of candidates; only the first one counts.
    Batch(Vec<ModelOutput>),
    /// Anything else.
    Raw(Value),
}

impl ModelOutput {
    /// Classify a JSON value by shape.
    ///
    /// Objects with a `text` key become [`ModelOutput::Hypothesis`], arrays
    /// become [`ModelOutput::Batch`] and everything else stays [`ModelOutput::Raw`].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("text") => {
                let text = map.remove("text").map(coerce).unwrap_or_default();
                let token_ids = map
                    .remove("tokenIds")
                    .or_else(|| map.remove("token_ids"))
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                #[allow(clippy::cast_possible_truncation)]
                let score = map
                    .get("score")
                    .and_then(Value::as_f64)
                    .map(|s| s as f32);
                Self::Hypothesis(Hypothesis {
                    text,
                    token_ids,
                    score,
                })
            }
            Value::Array(items) => Self::Batch(items.into_iter().map(Self::from_json).collect()),
            other => Self::Raw(other),
        }
    }

    /// Collapse to the transcript text.
    pub fn into_text(self) -> String {
        match self {
            Self::Hypothesis(hyp) => hyp.text,
            Self::Batch(items) => items
                .into_iter()
                .next()
                .map(Self::into_text)
                .unwrap_or_default(),
            Self::Raw(value) => coerce(value),
        }
    }
}

impl From<Hypothesis> for ModelOutput {
    fn from(hyp: Hypothesis) -> Self {
        Self::Hypothesis(hyp)
    }
}

/// String coercion: strings verbatim, everything else as compact JSON.
fn coerce(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn hypothesis_yields_text() {
        let out = ModelOutput::Hypothesis(Hypothesis::from_text("hello world"));
        assert_eq!(out.into_text(), "hello world");
    }

    #[test]
    fn batch_yields_first_element() {
        let out = ModelOutput::Batch(vec![
            ModelOutput::Raw(json!("first")),
            ModelOutput::Raw(json!("second")),
        ]);
        assert_eq!(out.into_text(), "first");
    }

    #[test]
    fn empty_batch_yields_empty_string() {
        assert_eq!(ModelOutput::Batch(Vec::new()).into_text(), "");
    }

    #[test]
    fn raw_string_is_verbatim() {
        assert_eq!(ModelOutput::Raw(json!("plain")).into_text(), "plain");
    }

    #[test]
    fn raw_other_is_coerced() {
        assert_eq!(ModelOutput::Raw(json!(42)).into_text(), "42");
        assert_eq!(ModelOutput::Raw(json!(true)).into_text(), "true");
        assert_eq!(ModelOutput::Raw(Value::Null).into_text(), "null");
        assert_eq!(
            ModelOutput::Raw(json!({"transcript": "x"})).into_text(),
            r#"{"transcript":"x"}"#
        );
    }

    #[test]
    fn from_json_object_with_text() {
        let out = ModelOutput::from_json(json!({"text": "hi", "score": -1.5, "tokenIds": [3, 4]}));
        assert_matches!(&out, ModelOutput::Hypothesis(h) if h.text == "hi" && h.token_ids == vec![3, 4]);
        assert_eq!(out.into_text(), "hi");
    }

    #[test]
    fn from_json_text_field_is_coerced() {
        let out = ModelOutput::from_json(json!({"text": 7}));
        assert_eq!(out.into_text(), "7");
    }

    #[test]
    fn from_json_object_without_text_is_raw() {
        let out = ModelOutput::from_json(json!({"words": []}));
        assert_matches!(out, ModelOutput::Raw(_));
    }

    #[test]
    fn from_json_array_of_hypotheses() {
        let out = ModelOutput::from_json(json!([{"text": "a"}, {"text": "b"}]));
        assert_matches!(&out, ModelOutput::Batch(items) if items.len() == 2);
        assert_eq!(out.into_text(), "a");
    }

    #[test]
    fn from_json_nested_lists() {
        let out = ModelOutput::from_json(json!([["inner", "x"], "outer"]));
        assert_eq!(out.into_text(), "inner");
    }

    #[test]
    fn from_json_empty_array() {
        assert_eq!(ModelOutput::from_json(json!([])).into_text(), "");
    }

    #[test]
    fn hypothesis_into_model_output() {
        let out: ModelOutput = Hypothesis::from_text("x").into();
        assert_matches!(out, ModelOutput::Hypothesis(_));
    }
}
