//! Change digest for a renewal.
//!
//! The digest is an HTML fragment posted as a note on the renewed
//! agreement: a bullet list of material term changes followed by the raw
//! delta in a collapsible block. Clause bodies are stored unsanitized, so
//! every piece of text is escaped here before it reaches markup.

use serde_json::Value;

use crate::delta::{same_value, Delta};

pub const NO_MATERIAL_CHANGES: &str = "No material term changes detected.";
pub const MATRIX_UPDATED: &str = "Manpower matrix updated.";
pub const CLAUSES_ADJUSTED: &str = "Clauses adjusted.";
pub const BONUS_RULES_CHANGED: &str = "Bonus/Penalty rules changed.";

const FINANCIAL_LABELS: [(&str, &str); 3] = [
    ("mgq_target", "MGQ Target"),
    ("part_a_fixed", "Part-A Fixed"),
    ("part_b_variable", "Part-B Variable"),
];

const COLLECTION_MESSAGES: [(&str, &str); 3] = [
    ("matrix", MATRIX_UPDATED),
    ("clauses", CLAUSES_ADJUSTED),
    ("bonus_rules", BONUS_RULES_CHANGED),
];

/// Plain-text summary lines describing what changed between two snapshots.
///
/// Never empty: an unchanged pair yields [`NO_MATERIAL_CHANGES`].
pub fn summary_lines(before: &Value, after: &Value) -> Vec<String> {
    let mut lines = Vec::new();

    let before_financial = before.get("financial");
    let after_financial = after.get("financial");
    for (key, label) in FINANCIAL_LABELS {
        let b = before_financial.and_then(|f| f.get(key));
        let a = after_financial.and_then(|f| f.get(key));
        if !same_entry(b, a) {
            lines.push(format!(
                "{}: {} → {}",
                label,
                format_amount(b),
                format_amount(a)
            ));
        }
    }

    for (key, message) in COLLECTION_MESSAGES {
        if !same_entry(before.get(key), after.get(key)) {
            lines.push(message.to_string());
        }
    }

    if lines.is_empty() {
        lines.push(NO_MATERIAL_CHANGES.to_string());
    }
    lines
}

fn same_entry(before: Option<&Value>, after: Option<&Value>) -> bool {
    match (before, after) {
        (Some(b), Some(a)) => same_value(b, a),
        (None, None) => true,
        _ => false,
    }
}

/// Render the full digest fragment.
pub fn render_digest(before: &Value, after: &Value, delta: &Delta) -> String {
    let items: String = summary_lines(before, after)
        .iter()
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect();
    let raw = serde_json::to_string_pretty(&delta.to_json()).unwrap_or_else(|_| "{}".to_string());

    format!(
        "<p><strong>Renewal Term Changes</strong></p>\
         <ul>{}</ul>\
         <details><summary>Raw JSON delta</summary><pre>{}</pre></details>",
        items,
        escape_html(&raw)
    )
}

/// Floats keep at least one decimal so `1000` reads as `1000.0`. Very large
/// and very small magnitudes use Rust's exponent form (`1e16`).
fn format_amount(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => format!("{:?}", 0.0_f64),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => format!("{:?}", f),
            None => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::diff;
    use serde_json::json;

    fn terms(mgq: f64, part_a: f64, clause_body: &str) -> Value {
        json!({
            "bonus_rules": [],
            "clauses": [{ "body_html": clause_body, "sequence": 10, "title": "Scope" }],
            "financial": { "mgq_target": mgq, "part_a_fixed": part_a, "part_b_variable": 0.0 },
            "matrix": [],
        })
    }

    #[test]
    fn unchanged_terms_report_no_material_changes() {
        let doc = terms(1000.0, 5.0, "");
        assert_eq!(summary_lines(&doc, &doc), vec![NO_MATERIAL_CHANGES.to_string()]);

        let html = render_digest(&doc, &doc, &diff(&doc, &doc));
        assert!(html.contains("<li>No material term changes detected.</li>"));
        assert_eq!(html.matches("<li>").count(), 1);
        assert!(html.contains("<pre>{}</pre>"));
    }

    #[test]
    fn financial_change_line() {
        let before = terms(1000.0, 5.0, "");
        let after = terms(1500.0, 5.0, "");
        assert_eq!(
            summary_lines(&before, &after),
            vec!["MGQ Target: 1000.0 → 1500.0".to_string()]
        );
    }

    #[test]
    fn financial_lines_keep_fixed_order() {
        let before = terms(1.0, 2.0, "");
        let after = terms(3.0, 4.5, "");
        let lines = summary_lines(&before, &after);
        assert_eq!(lines[0], "MGQ Target: 1.0 → 3.0");
        assert_eq!(lines[1], "Part-A Fixed: 2.0 → 4.5");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn collection_changes_are_flagged() {
        let before = terms(1.0, 2.0, "old");
        let mut after = terms(1.0, 2.0, "new");
        after["matrix"] = json!([{ "designation": "Driver" }]);
        assert_eq!(
            summary_lines(&before, &after),
            vec![MATRIX_UPDATED.to_string(), CLAUSES_ADJUSTED.to_string()]
        );
    }

    #[test]
    fn markup_in_delta_is_escaped() {
        let before = terms(1.0, 2.0, "");
        let after = terms(1.0, 2.0, "<script>alert('x')</script>");
        let html = render_digest(&before, &after, &diff(&before, &after));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("<li>Clauses adjusted.</li>"));
    }

    #[test]
    fn raw_delta_is_pretty_printed() {
        let before = terms(1000.0, 2.0, "");
        let after = terms(1500.0, 2.0, "");
        let html = render_digest(&before, &after, &diff(&before, &after));
        let expected = escape_html("{\n  \"financial\": {\n    \"mgq_target\": 1500.0\n  }\n}");
        assert!(html.contains(&expected), "got {html}");
    }

    #[test]
    fn integer_and_float_amounts_are_equal() {
        let before = json!({
            "bonus_rules": [],
            "clauses": [],
            "financial": { "mgq_target": 1000, "part_a_fixed": 0, "part_b_variable": 0.0 },
            "matrix": [{ "base_rate": 900, "headcount": 2 }],
        });
        let after = json!({
            "bonus_rules": [],
            "clauses": [],
            "financial": { "mgq_target": 1000.0, "part_a_fixed": 0.0, "part_b_variable": 0.0 },
            "matrix": [{ "base_rate": 900.0, "headcount": 2 }],
        });
        assert_eq!(summary_lines(&before, &after), vec![NO_MATERIAL_CHANGES.to_string()]);
        assert_eq!(diff(&before, &after).to_json(), json!({}));
    }

    #[test]
    fn integer_amount_renders_with_decimal() {
        let before = json!({ "financial": { "mgq_target": 1000 } });
        let after = json!({ "financial": { "mgq_target": 1500 } });
        assert_eq!(summary_lines(&before, &after), vec!["MGQ Target: 1000.0 → 1500.0".to_string()]);
    }

    #[test]
    fn large_amounts_use_exponent_form() {
        assert_eq!(format_amount(Some(&json!(1e16))), "1e16");
        assert_eq!(format_amount(Some(&json!(123456.5))), "123456.5");
        assert_eq!(format_amount(None), "0.0");
    }

    #[test]
    fn escape_html_handles_all_specials() {
        assert_eq!(escape_html(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&#39;");
        assert_eq!(escape_html("1.0 → 2.0"), "1.0 → 2.0");
    }
}
