//! Agreement records as the renewal workflow sees them.
//!
//! An [`Agreement`] owns three line collections: the manpower matrix,
//! the clause list and the bonus/penalty rules. Lines are never shared
//! between agreements; a renewal always creates fresh lines.

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Lifecycle stage of an agreement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementState {
    #[default]
    Draft,
    Review,
    Active,
    Expired,
    Terminated,
}

impl AgreementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementState::Draft => "draft",
            AgreementState::Review => "review",
            AgreementState::Active => "active",
            AgreementState::Expired => "expired",
            AgreementState::Terminated => "terminated",
        }
    }
}

/// Working shift of a manpower matrix line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Day,
    Night,
    Rotational,
    /// General 8-hour shift.
    #[default]
    General,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "day",
            Shift::Night => "night",
            Shift::Rotational => "rotational",
            Shift::General => "general",
        }
    }
}

/// Billing category of a manpower matrix line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    /// Part-A: fixed monthly cost.
    #[default]
    PartA,
    /// Part-B: variable cost linked to the MGQ target.
    PartB,
}

impl CostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::PartA => "part_a",
            CostCategory::PartB => "part_b",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[default]
    Bonus,
    Penalty,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Bonus => "bonus",
            RuleType::Penalty => "penalty",
        }
    }
}

pub(crate) fn default_headcount() -> u32 {
    1
}

pub(crate) fn default_sequence() -> i64 {
    10
}

/// One staffing row of the manpower matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixLine {
    pub id: u64,
    /// Not every host exposes an ordering column for matrix lines.
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

impl MatrixLine {
    pub fn total_amount(&self) -> f64 {
        f64::from(self.headcount) * self.base_rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseLine {
    pub id: u64,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    pub title: String,
    /// Rich text as captured from the operator. Not sanitized.
    #[serde(default)]
    pub body_html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRuleLine {
    pub id: u64,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    /// Rule label.
    pub name: String,
    #[serde(default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub trigger_condition: String,
    /// Adjustment in percent.
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub notes: String,
}

/// Aggregates derived from the manpower matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManpowerTotals {
    pub part_a_amount: f64,
    pub part_b_amount: f64,
    pub total_headcount: u32,
}

impl ManpowerTotals {
    pub fn from_matrix(lines: &[MatrixLine]) -> Self {
        lines.iter().fold(Self::default(), |mut acc, line| {
            match line.remark {
                CostCategory::PartA => acc.part_a_amount += line.total_amount(),
                CostCategory::PartB => acc.part_b_amount += line.total_amount(),
            }
            acc.total_headcount = acc.total_headcount.saturating_add(line.headcount);
            acc
        })
    }
}

/// A manpower-supply agreement and its owned lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agreement {
    pub id: u64,
    pub name: String,
    pub state: AgreementState,
    /// Stored revision number. `None` and `0` both read as revision 1.
    pub revision_no: Option<u32>,
    pub previous_agreement_id: Option<u64>,
    pub next_agreement_id: Option<u64>,

    pub contractor_id: Option<u64>,
    pub contract_type: Option<String>,
    pub currency_id: Option<u64>,

    #[serde(with = "iso_date::option")]
    pub validity_start: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub validity_end: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub end_date: Option<Date>,

    pub mgq_target: Option<f64>,
    pub part_a_fixed: Option<f64>,
    pub part_b_variable: Option<f64>,

    pub sign_request_id: Option<u64>,
    pub sign_state: Option<String>,
    pub is_agreement_signed: bool,

    pub preview_pdf: Option<String>,
    pub preview_pdf_filename: Option<String>,
    pub preview_cache_key: Option<String>,

    pub manpower_totals: ManpowerTotals,

    pub manpower_matrix: Vec<MatrixLine>,
    pub clauses: Vec<ClauseLine>,
    pub bonus_rules: Vec<BonusRuleLine>,
}

impl Agreement {
    /// Effective revision number.
    pub fn revision_no(&self) -> u32 {
        self.revision_no.filter(|r| *r > 0).unwrap_or(1)
    }

    /// Matrix lines ordered by `(sequence or 0, id)`.
    pub fn sorted_matrix(&self) -> Vec<&MatrixLine> {
        let mut lines: Vec<&MatrixLine> = self.manpower_matrix.iter().collect();
        lines.sort_by_key(|l| (l.sequence.unwrap_or(0), l.id));
        lines
    }

    /// Clauses ordered by `(sequence, id)`.
    pub fn sorted_clauses(&self) -> Vec<&ClauseLine> {
        let mut lines: Vec<&ClauseLine> = self.clauses.iter().collect();
        lines.sort_by_key(|l| (l.sequence, l.id));
        lines
    }

    /// Bonus/penalty rules ordered by `(sequence, id)`.
    pub fn sorted_bonus_rules(&self) -> Vec<&BonusRuleLine> {
        let mut lines: Vec<&BonusRuleLine> = self.bonus_rules.iter().collect();
        lines.sort_by_key(|l| (l.sequence, l.id));
        lines
    }
}
