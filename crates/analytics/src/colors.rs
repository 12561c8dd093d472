use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

/// Paints a cell `color` when its value is above or below `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub id: String,
    pub operator: ThresholdOperator,
    pub threshold: Decimal,
    pub color: String,
}

impl ThresholdRule {
    pub fn matches(&self, value: Decimal) -> bool {
        match self.operator {
            ThresholdOperator::GreaterThan => value > self.threshold,
            ThresholdOperator::LessThan => value < self.threshold,
        }
    }
}

/// Colour rules for one table field of one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldColorSettings {
    #[serde(default)]
    pub text_color_rules: Vec<ThresholdRule>,
    #[serde(default)]
    pub background_color_rules: Vec<ThresholdRule>,
}

/// The colour of the first rule that matches `value`. Rules are evaluated in
/// the order the user arranged them.
pub fn resolve_color(rules: &[ThresholdRule], value: Decimal) -> Option<&str> {
    rules
        .iter()
        .find(|r| r.matches(value))
        .map(|r| r.color.as_str())
}
