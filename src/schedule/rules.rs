use serde::{Deserialize, Serialize};

/// Rule switches for the assignment generator, loaded once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Length of the generated period in weeks.
    #[serde(default = "default_period_weeks")]
    pub period_weeks: u32,

    /// Never schedule a MORNING directly after an EVENING for the same person.
    #[serde(default = "default_true")]
    pub avoid_morning_after_evening: bool,

    /// Steer each person's MORNING and EVENING counts towards each other.
    #[serde(default = "default_true")]
    pub balance_shifts: bool,

    #[serde(default)]
    pub day_off: DayOffRule,
}

/// Weekly day-off quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOffRule {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,
}

fn default_period_weeks() -> u32 {
    2
}

fn default_days_per_week() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for DayOffRule {
    fn default() -> Self {
        Self {
            enabled: true,
            days_per_week: default_days_per_week(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            period_weeks: default_period_weeks(),
            avoid_morning_after_evening: true,
            balance_shifts: true,
            day_off: DayOffRule::default(),
        }
    }
}

impl RuleConfig {
    /// All rules switched off: every day is a random MORNING or EVENING.
    pub fn unconstrained(period_weeks: u32) -> Self {
        Self {
            period_weeks,
            avoid_morning_after_evening: false,
            balance_shifts: false,
            day_off: DayOffRule {
                enabled: false,
                days_per_week: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_enable_everything() {
        let rules = RuleConfig::default();
        assert_eq!(rules.period_weeks, 2);
        assert!(rules.avoid_morning_after_evening);
        assert!(rules.balance_shifts);
        assert!(rules.day_off.enabled);
        assert_eq!(rules.day_off.days_per_week, 2);
    }

    #[test]
    fn deserialize_partial_rules() {
        let rules: RuleConfig = toml::from_str(
            r#"
            period_weeks = 4
            balance_shifts = false

            [day_off]
            days_per_week = 1
            "#,
        )
        .unwrap();
        assert_eq!(rules.period_weeks, 4);
        assert!(!rules.balance_shifts);
        assert!(rules.avoid_morning_after_evening);
        assert!(rules.day_off.enabled);
        assert_eq!(rules.day_off.days_per_week, 1);
    }
}
