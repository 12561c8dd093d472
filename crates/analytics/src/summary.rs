use core_types::TeamMetric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Traffic-light status for a value measured against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Good,
    Warning,
    Danger,
}

/// Which direction of deviation from the target is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Reaching or beating the target is good (inquiries, deposits).
    Reach,
    /// Staying under the target is good (spend against budget).
    StayUnder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub value: Decimal,
    pub target: Decimal,
    pub percentage: Decimal,
    pub status: ProgressStatus,
}

/// Share of `value` in `total` as a percentage, zero when `total` is not positive.
pub fn percentage(value: Decimal, total: Decimal) -> Decimal {
    if total > Decimal::ZERO {
        value
            .checked_div(total)
            .map(|r| r * Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// Measures `value` against `target`.
///
/// `Reach`: ≥100% good, ≥80% warning, otherwise danger.
/// `StayUnder`: ≤100% good, ≤150% warning, otherwise danger.
pub fn progress(value: Decimal, target: Decimal, kind: Target) -> Progress {
    let pct = percentage(value, target);
    let status = match kind {
        Target::Reach if pct >= Decimal::ONE_HUNDRED => ProgressStatus::Good,
        Target::Reach if pct >= Decimal::from(80) => ProgressStatus::Warning,
        Target::Reach => ProgressStatus::Danger,
        Target::StayUnder if pct <= Decimal::ONE_HUNDRED => ProgressStatus::Good,
        Target::StayUnder if pct <= Decimal::from(150) => ProgressStatus::Warning,
        Target::StayUnder => ProgressStatus::Danger,
    };
    Progress {
        value,
        target,
        percentage: pct,
        status,
    }
}

/// Whether a team's spend is within its planned spend for the period.
pub fn is_within_budget(team: &TeamMetric) -> bool {
    team.actual_spend <= team.planned_daily_spend
}

/// Keeps the teams belonging to a group, in the group's configured order.
pub fn select_group(teams: &[TeamMetric], members: &[String]) -> Vec<TeamMetric> {
    let mut selected: Vec<(usize, &TeamMetric)> = teams
        .iter()
        .filter_map(|t| {
            members
                .iter()
                .position(|m| *m == t.team_name)
                .map(|pos| (pos, t))
        })
        .collect();
    selected.sort_by_key(|(pos, _)| *pos);
    selected.into_iter().map(|(_, t)| t.clone()).collect()
}

/// Headline figures for a set of teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub team_count: usize,
    pub total_inquiries: Decimal,
    pub total_planned_inquiries: Decimal,
    pub total_spend: Decimal,
    pub total_planned_spend: Decimal,
    pub total_deposits: Decimal,
    /// Unweighted mean of the teams' period CPM.
    pub average_cpm: Decimal,
    pub inquiries: Progress,
    pub spend: Progress,
}

impl GroupSummary {
    pub fn from_teams(teams: &[TeamMetric]) -> Self {
        let sum = |f: fn(&TeamMetric) -> Decimal| teams.iter().map(f).sum::<Decimal>();

        let total_inquiries = sum(|t| t.total_inquiries);
        let total_planned_inquiries = sum(|t| t.planned_inquiries);
        let total_spend = sum(|t| t.actual_spend);
        let total_planned_spend = sum(|t| t.planned_daily_spend);
        let total_deposits = sum(|t| t.deposits_count);
        let average_cpm = if teams.is_empty() {
            Decimal::ZERO
        } else {
            sum(|t| t.cpm_cost_per_inquiry) / Decimal::from(teams.len())
        };

        Self {
            team_count: teams.len(),
            total_inquiries,
            total_planned_inquiries,
            total_spend,
            total_planned_spend,
            total_deposits,
            average_cpm,
            inquiries: progress(total_inquiries, total_planned_inquiries, Target::Reach),
            spend: progress(total_spend, total_planned_spend, Target::StayUnder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn team(
        name: &str,
        inquiries: Decimal,
        planned: Decimal,
        spend: Decimal,
        budget: Decimal,
    ) -> TeamMetric {
        let mut t = TeamMetric::new(name);
        t.total_inquiries = inquiries;
        t.planned_inquiries = planned;
        t.actual_spend = spend;
        t.planned_daily_spend = budget;
        t
    }

    #[test]
    fn reach_thresholds() {
        let status = |value| progress(value, dec!(100), Target::Reach).status;
        assert_eq!(status(dec!(100)), ProgressStatus::Good);
        assert_eq!(status(dec!(80)), ProgressStatus::Warning);
        assert_eq!(status(dec!(79)), ProgressStatus::Danger);
    }

    #[test]
    fn stay_under_thresholds() {
        let status = |value| progress(value, dec!(100), Target::StayUnder).status;
        assert_eq!(status(dec!(100)), ProgressStatus::Good);
        assert_eq!(status(dec!(150)), ProgressStatus::Warning);
        assert_eq!(status(dec!(151)), ProgressStatus::Danger);
    }

    #[test]
    fn zero_target_is_zero_percent() {
        let p = progress(dec!(50), Decimal::ZERO, Target::Reach);
        assert_eq!(p.percentage, Decimal::ZERO);
        assert_eq!(p.status, ProgressStatus::Danger);
        assert_eq!(percentage(dec!(5), dec!(-1)), Decimal::ZERO);
    }

    #[test]
    fn select_group_filters_and_orders_by_config() {
        let teams = vec![
            team("Beta", dec!(1), dec!(1), dec!(1), dec!(1)),
            team("Gamma", dec!(1), dec!(1), dec!(1), dec!(1)),
            team("Alpha", dec!(1), dec!(1), dec!(1), dec!(1)),
        ];
        let members = vec!["Alpha".to_string(), "Beta".to_string(), "Delta".to_string()];
        let names: Vec<_> = select_group(&teams, &members)
            .into_iter()
            .map(|t| t.team_name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn summary_totals_and_average() {
        let mut a = team("Alpha", dec!(90), dec!(100), dec!(500), dec!(400));
        a.cpm_cost_per_inquiry = dec!(2);
        a.deposits_count = dec!(3);
        let mut b = team("Beta", dec!(30), dec!(20), dec!(100), dec!(200));
        b.cpm_cost_per_inquiry = dec!(4);
        b.deposits_count = dec!(1);

        let s = GroupSummary::from_teams(&[a.clone(), b]);
        assert_eq!(s.team_count, 2);
        assert_eq!(s.total_inquiries, dec!(120));
        assert_eq!(s.total_deposits, dec!(4));
        assert_eq!(s.average_cpm, dec!(3));
        assert_eq!(s.inquiries.status, ProgressStatus::Good);
        assert_eq!(s.spend.percentage, dec!(100));
        assert!(!is_within_budget(&a));
    }

    #[test]
    fn empty_group_summary_is_zeroed() {
        let s = GroupSummary::from_teams(&[]);
        assert_eq!(s.team_count, 0);
        assert_eq!(s.average_cpm, Decimal::ZERO);
    }
}
