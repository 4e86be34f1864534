use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::AnalysisError;

use crate::meals::repo_types::{DEFAULT_FOOD_SCORE, MAX_CALORIES, MAX_MACRO_GRAMS};

const FENCE: &str = "```";

lazy_static! {
    static ref LEADING_NUMBER_RE: Regex = Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").unwrap();
}

/// Validated nutrition estimate. Ephemeral: it is returned to the client and
/// only becomes a meal if the client logs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_score: i32,
    pub health_benefits: Vec<String>,
    pub health_negatives: Vec<String>,
    pub portion_estimate: String,
    /// Base64 JPEG preview, present only for image analyses that could be decoded.
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub reason: String,
}

/// Removes a markdown code fence (with optional language tag) around the
/// reply, along with any chatter after the closing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    // The opening line only carries the language tag.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.rsplit_once(FENCE)
        .map_or(body, |(inner, _)| inner)
        .trim()
}

pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let value = parse_json(raw)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AnalysisError::Parse("expected a JSON object".into()))?;

    Ok(AnalysisResult {
        food_name: required_text(obj, "food_name")?,
        calories: bounded(obj.get("calories"), MAX_CALORIES),
        protein: bounded(obj.get("protein"), MAX_MACRO_GRAMS),
        carbs: bounded(obj.get("carbs"), MAX_MACRO_GRAMS),
        fat: bounded(obj.get("fat"), MAX_MACRO_GRAMS),
        food_score: food_score(obj.get("food_score")),
        health_benefits: text_list(obj.get("health_benefits")),
        health_negatives: text_list(obj.get("health_negatives")),
        portion_estimate: required_text(obj, "portion_estimate")?,
        thumbnail: None,
    })
}

pub fn parse_suggestions(raw: &str) -> Result<Vec<Suggestion>, AnalysisError> {
    let value = parse_json(raw)?;
    let items = value
        .as_array()
        .ok_or_else(|| AnalysisError::Parse("expected a JSON array".into()))?;

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let name = non_blank(obj.get("name"))?;
            Some(Suggestion {
                name,
                calories: bounded(obj.get("calories"), MAX_CALORIES),
                protein: bounded(obj.get("protein"), MAX_MACRO_GRAMS),
                reason: non_blank(obj.get("reason")).unwrap_or_default(),
            })
        })
        .collect())
}

fn parse_json(raw: &str) -> Result<Value, AnalysisError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| AnalysisError::Parse(e.to_string()))
}

fn required_text(obj: &Map<String, Value>, key: &str) -> Result<String, AnalysisError> {
    non_blank(obj.get(key)).ok_or_else(|| AnalysisError::Parse(format!("missing `{key}`")))
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a JSON number or a numeric string such as `"350 kcal"`.
fn number_like(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER_RE
            .captures(s)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn bounded(value: Option<&Value>, max: f64) -> f64 {
    number_like(value).unwrap_or(0.0).clamp(0.0, max)
}

fn food_score(value: Option<&Value>) -> i32 {
    number_like(value)
        .map(|n| n.round().clamp(1.0, 10.0) as i32)
        .unwrap_or(DEFAULT_FOOD_SCORE)
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| non_blank(Some(v))).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_language_tagged_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_and_surrounding_whitespace() {
        let raw = "  \n```\n[1, 2]\n```  \n";
        assert_eq!(strip_code_fences(raw), "[1, 2]");
    }

    #[test]
    fn text_after_the_closing_fence_is_dropped() {
        let raw = "```json\n{\"food_name\": \"Rice\", \"calories\": 200, \
                   \"portion_estimate\": \"1 cup\"}\n```\nLet me know if you need more detail.";
        let result = parse_analysis(raw).expect("parse");
        assert_eq!(result.food_name, "Rice");
        assert_eq!(result.calories, 200.0);
        assert_eq!(result.portion_estimate, "1 cup");
    }

    #[test]
    fn single_line_fence_is_stripped() {
        assert_eq!(strip_code_fences("```[1, 2]```"), "[1, 2]");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn full_analysis_is_normalized() {
        let raw = r#"```json
{
  "food_name": "  Chicken Caesar salad ",
  "calories": "480 kcal",
  "protein": 32.5,
  "carbs": 14,
  "fat": 31,
  "food_score": 6.6,
  "health_benefits": ["Lean protein", "", 42, "Leafy greens"],
  "health_negatives": ["High sodium dressing"],
  "portion_estimate": "1 large bowl"
}
```"#;
        let result = parse_analysis(raw).expect("parse");
        assert_eq!(result.food_name, "Chicken Caesar salad");
        assert_eq!(result.calories, 480.0);
        assert_eq!(result.protein, 32.5);
        assert_eq!(result.food_score, 7);
        assert_eq!(result.health_benefits, vec!["Lean protein", "Leafy greens"]);
        assert_eq!(result.health_negatives, vec!["High sodium dressing"]);
        assert_eq!(result.portion_estimate, "1 large bowl");
        assert_eq!(result.thumbnail, None);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let raw = r#"{"food_name": "Mystery", "portion_estimate": "1 plate",
            "calories": -50, "protein": 5000, "fat": "lots", "food_score": 42}"#;
        let result = parse_analysis(raw).expect("parse");
        assert_eq!(result.calories, 0.0);
        assert_eq!(result.protein, MAX_MACRO_GRAMS);
        assert_eq!(result.carbs, 0.0);
        assert_eq!(result.fat, 0.0);
        assert_eq!(result.food_score, 10);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let raw = r#"{"food_name": "Water", "calories": 0, "portion_estimate": "1 glass"}"#;
        let result = parse_analysis(raw).expect("parse");
        assert_eq!(result.calories, 0.0);
        assert_eq!(result.food_score, DEFAULT_FOOD_SCORE);
        assert!(result.health_benefits.is_empty());
        assert!(result.health_negatives.is_empty());
    }

    #[test]
    fn missing_required_text_is_rejected() {
        let no_name = r#"{"calories": 100, "portion_estimate": "1 cup"}"#;
        let no_portion = r#"{"food_name": "Rice", "calories": 100}"#;
        for raw in [no_name, no_portion] {
            assert!(matches!(parse_analysis(raw), Err(AnalysisError::Parse(_))));
        }
    }

    #[test]
    fn non_object_analysis_is_rejected() {
        assert!(matches!(parse_analysis("[1, 2]"), Err(AnalysisError::Parse(_))));
        assert!(matches!(parse_analysis("not json"), Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn suggestions_skip_unnamed_entries() {
        let raw = r#"```
[
  {"name": "Greek yogurt bowl", "calories": 320, "protein": "22g", "reason": "High protein"},
  {"calories": 200},
  "stray text",
  {"name": "Veggie stir fry", "calories": 410}
]
```"#;
        let suggestions = parse_suggestions(raw).expect("parse");
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].protein, 22.0);
        assert_eq!(suggestions[1].name, "Veggie stir fry");
        assert_eq!(suggestions[1].reason, "");
    }

    #[test]
    fn suggestions_require_an_array() {
        let raw = r#"{"name": "Soup"}"#;
        assert!(matches!(parse_suggestions(raw), Err(AnalysisError::Parse(_))));
    }
}
