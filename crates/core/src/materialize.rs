//! Staged line copies.
//!
//! Staged lines are plain field copies of an agreement's lines without
//! identity. They are what the operator edits during a renewal, and what
//! the new agreement's lines are created from.

use serde::{Deserialize, Serialize};

use crate::model::{
    default_headcount, default_sequence, Agreement, BonusRuleLine, ClauseLine, CostCategory,
    MatrixLine, RuleType, Shift,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedMatrixLine {
    #[serde(default)]
    pub sequence: Option<i64>,
    pub designation: String,
    #[serde(default)]
    pub employee_id: Option<u64>,
    #[serde(default)]
    pub vehicle_id: Option<u64>,
    #[serde(default = "default_headcount")]
    pub headcount: u32,
    #[serde(default)]
    pub shift: Shift,
    #[serde(default)]
    pub remark: CostCategory,
    #[serde(default)]
    pub base_rate: f64,
}

impl StagedMatrixLine {
    pub fn new(designation: impl Into<String>, base_rate: f64) -> Self {
        Self {
            sequence: None,
            designation: designation.into(),
            employee_id: None,
            vehicle_id: None,
            headcount: default_headcount(),
            shift: Shift::default(),
            remark: CostCategory::default(),
            base_rate,
        }
    }

    pub fn total_amount(&self) -> f64 {
        f64::from(self.headcount) * self.base_rate
    }
}

impl From<&MatrixLine> for StagedMatrixLine {
    fn from(line: &MatrixLine) -> Self {
        Self {
            sequence: line.sequence,
            designation: line.designation.clone(),
            employee_id: line.employee_id,
            vehicle_id: line.vehicle_id,
            headcount: line.headcount,
            shift: line.shift,
            remark: line.remark,
            base_rate: line.base_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedClauseLine {
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    pub title: String,
    #[serde(default)]
    pub body_html: String,
}

impl StagedClauseLine {
    pub fn new(title: impl Into<String>, body_html: impl Into<String>) -> Self {
        Self {
            sequence: default_sequence(),
            title: title.into(),
            body_html: body_html.into(),
        }
    }
}

impl From<&ClauseLine> for StagedClauseLine {
    fn from(line: &ClauseLine) -> Self {
        Self {
            sequence: line.sequence,
            title: line.title.clone(),
            body_html: line.body_html.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedBonusRuleLine {
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    pub name: String,
    #[serde(default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub trigger_condition: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub notes: String,
}

impl StagedBonusRuleLine {
    pub fn new(name: impl Into<String>, rule_type: RuleType, percentage: f64) -> Self {
        Self {
            sequence: default_sequence(),
            name: name.into(),
            rule_type,
            trigger_condition: String::new(),
            percentage,
            notes: String::new(),
        }
    }
}

impl From<&BonusRuleLine> for StagedBonusRuleLine {
    fn from(line: &BonusRuleLine) -> Self {
        Self {
            sequence: line.sequence,
            name: line.name.clone(),
            rule_type: line.rule_type,
            trigger_condition: line.trigger_condition.clone(),
            percentage: line.percentage,
            notes: line.notes.clone(),
        }
    }
}

/// The three staged collections of a renewal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedLines {
    pub matrix: Vec<StagedMatrixLine>,
    pub clauses: Vec<StagedClauseLine>,
    pub bonus_rules: Vec<StagedBonusRuleLine>,
}

/// Copy `source`'s lines into staging order.
pub fn materialize(source: &Agreement) -> StagedLines {
    StagedLines {
        matrix: source
            .sorted_matrix()
            .into_iter()
            .map(StagedMatrixLine::from)
            .collect(),
        clauses: source
            .sorted_clauses()
            .into_iter()
            .map(StagedClauseLine::from)
            .collect(),
        bonus_rules: source
            .sorted_bonus_rules()
            .into_iter()
            .map(StagedBonusRuleLine::from)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Agreement {
        Agreement {
            id: 4,
            manpower_matrix: vec![
                MatrixLine {
                    id: 8,
                    sequence: Some(2),
                    designation: "Helper".to_string(),
                    employee_id: None,
                    vehicle_id: None,
                    headcount: 4,
                    shift: Shift::Rotational,
                    remark: CostCategory::PartB,
                    base_rate: 12_500.0,
                },
                MatrixLine {
                    id: 9,
                    sequence: Some(1),
                    designation: "Driver".to_string(),
                    employee_id: Some(77),
                    vehicle_id: Some(3),
                    headcount: 1,
                    shift: Shift::Day,
                    remark: CostCategory::PartA,
                    base_rate: 21_000.0,
                },
            ],
            clauses: vec![
                ClauseLine {
                    id: 5,
                    sequence: 10,
                    title: "B".to_string(),
                    body_html: String::new(),
                },
                ClauseLine {
                    id: 2,
                    sequence: 10,
                    title: "A".to_string(),
                    body_html: "<b>bold</b>".to_string(),
                },
            ],
            bonus_rules: vec![BonusRuleLine {
                id: 1,
                sequence: 10,
                name: "Uptime".to_string(),
                rule_type: RuleType::Bonus,
                trigger_condition: "uptime >= 99%".to_string(),
                percentage: 1.5,
                notes: "quarterly".to_string(),
            }],
            ..Agreement::default()
        }
    }

    #[test]
    fn copies_all_fields_in_order() {
        let staged = materialize(&source());

        assert_eq!(staged.matrix.len(), 2);
        let driver = &staged.matrix[0];
        assert_eq!(driver.designation, "Driver");
        assert_eq!(driver.employee_id, Some(77));
        assert_eq!(driver.vehicle_id, Some(3));
        assert_eq!(driver.shift, Shift::Day);
        assert_eq!(driver.sequence, Some(1));
        assert_eq!(staged.matrix[1].total_amount(), 50_000.0);

        let titles: Vec<&str> = staged.clauses.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(staged.clauses[0].body_html, "<b>bold</b>");

        assert_eq!(staged.bonus_rules[0].trigger_condition, "uptime >= 99%");
        assert_eq!(staged.bonus_rules[0].notes, "quarterly");
    }

    #[test]
    fn empty_source_stages_nothing() {
        assert_eq!(materialize(&Agreement::default()), StagedLines::default());
    }

    #[test]
    fn new_lines_use_defaults() {
        let line = StagedMatrixLine::new("Mechanic", 15_000.0);
        assert_eq!(line.headcount, 1);
        assert_eq!(line.shift, Shift::General);
        assert_eq!(line.remark, CostCategory::PartA);
        assert_eq!(StagedClauseLine::new("Scope", "").sequence, 10);
    }
}
