//! Term snapshots.
//!
//! A snapshot is the comparable view of an agreement's commercial terms:
//! the three financial scalars plus the matrix, clause and rule lines.
//! Line identities are left out so that a renewed agreement with copied
//! lines snapshots identically to its source.

use serde_json::{json, Map, Value};

use crate::model::{Agreement, BonusRuleLine, ClauseLine, MatrixLine};

/// A term snapshot. Objects use sorted keys, so the serialized form is
/// byte-stable for equal agreement state.
pub type Document = Value;

/// Financial keys tracked by snapshots, in display order.
pub const FINANCIAL_KEYS: [&str; 3] = ["mgq_target", "part_a_fixed", "part_b_variable"];

/// Build the term snapshot of `agreement`.
pub fn snapshot(agreement: &Agreement) -> Document {
    let mut financial = Map::new();
    financial.insert(
        "mgq_target".to_string(),
        json!(agreement.mgq_target.unwrap_or(0.0)),
    );
    financial.insert(
        "part_a_fixed".to_string(),
        json!(agreement.part_a_fixed.unwrap_or(0.0)),
    );
    financial.insert(
        "part_b_variable".to_string(),
        json!(agreement.part_b_variable.unwrap_or(0.0)),
    );

    let matrix: Vec<Value> = agreement
        .sorted_matrix()
        .into_iter()
        .map(matrix_entry)
        .collect();
    let clauses: Vec<Value> = agreement
        .sorted_clauses()
        .into_iter()
        .map(clause_entry)
        .collect();
    let bonus_rules: Vec<Value> = agreement
        .sorted_bonus_rules()
        .into_iter()
        .map(rule_entry)
        .collect();

    json!({
        "bonus_rules": bonus_rules,
        "clauses": clauses,
        "financial": Value::Object(financial),
        "matrix": matrix,
    })
}

fn matrix_entry(line: &MatrixLine) -> Value {
    json!({
        "base_rate": line.base_rate,
        "designation": line.designation,
        "employee_id": line.employee_id,
        "headcount": line.headcount,
        "remark": line.remark.as_str(),
        "shift": line.shift.as_str(),
        "vehicle_id": line.vehicle_id,
    })
}

fn clause_entry(line: &ClauseLine) -> Value {
    json!({
        "body_html": line.body_html,
        "sequence": line.sequence,
        "title": line.title,
    })
}

fn rule_entry(line: &BonusRuleLine) -> Value {
    json!({
        "name": line.name,
        "notes": line.notes,
        "percentage": line.percentage,
        "rule_type": line.rule_type.as_str(),
        "sequence": line.sequence,
        "trigger_condition": line.trigger_condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CostCategory, RuleType, Shift};

    fn sample() -> Agreement {
        Agreement {
            id: 1,
            name: "AGR/0001".to_string(),
            mgq_target: Some(1000.0),
            part_a_fixed: Some(250_000.0),
            manpower_matrix: vec![
                MatrixLine {
                    id: 11,
                    sequence: None,
                    designation: "Pump operator".to_string(),
                    employee_id: Some(42),
                    vehicle_id: None,
                    headcount: 3,
                    shift: Shift::Night,
                    remark: CostCategory::PartB,
                    base_rate: 18_000.0,
                },
                MatrixLine {
                    id: 10,
                    sequence: None,
                    designation: "Supervisor".to_string(),
                    employee_id: None,
                    vehicle_id: Some(5),
                    headcount: 1,
                    shift: Shift::Day,
                    remark: CostCategory::PartA,
                    base_rate: 30_000.0,
                },
            ],
            clauses: vec![
                ClauseLine {
                    id: 21,
                    sequence: 20,
                    title: "Payment".to_string(),
                    body_html: "<p>Net 30</p>".to_string(),
                },
                ClauseLine {
                    id: 20,
                    sequence: 10,
                    title: "Scope".to_string(),
                    body_html: String::new(),
                },
            ],
            bonus_rules: vec![BonusRuleLine {
                id: 30,
                sequence: 10,
                name: "Late deployment".to_string(),
                rule_type: RuleType::Penalty,
                trigger_condition: "delay > 2 days".to_string(),
                percentage: 2.5,
                notes: String::new(),
            }],
            ..Agreement::default()
        }
    }

    #[test]
    fn snapshot_is_deterministic() {
        let a = sample();
        let first = snapshot(&a);
        let second = snapshot(&a);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn financial_defaults_to_zero() {
        let doc = snapshot(&sample());
        assert_eq!(doc["financial"]["mgq_target"], json!(1000.0));
        assert_eq!(doc["financial"]["part_a_fixed"], json!(250_000.0));
        assert_eq!(doc["financial"]["part_b_variable"], json!(0.0));
    }

    #[test]
    fn lines_are_ordered_and_identity_free() {
        let doc = snapshot(&sample());

        let matrix = doc["matrix"].as_array().unwrap();
        assert_eq!(matrix[0]["designation"], "Supervisor");
        assert_eq!(matrix[1]["designation"], "Pump operator");
        assert_eq!(matrix[1]["shift"], "night");
        assert_eq!(matrix[1]["remark"], "part_b");
        assert!(matrix[0].get("id").is_none());

        let clauses = doc["clauses"].as_array().unwrap();
        assert_eq!(clauses[0]["title"], "Scope");
        assert_eq!(clauses[1]["title"], "Payment");

        assert_eq!(doc["bonus_rules"][0]["rule_type"], "penalty");
    }

    #[test]
    fn line_ids_do_not_affect_snapshot() {
        let a = sample();
        let mut b = sample();
        for (i, line) in b.clauses.iter_mut().enumerate() {
            line.id = 500 + i as u64;
        }
        b.id = 99;
        assert_eq!(snapshot(&a), snapshot(&b));
    }

    #[test]
    fn top_level_keys() {
        let doc = snapshot(&Agreement::default());
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["bonus_rules", "clauses", "financial", "matrix"]);
    }
}
