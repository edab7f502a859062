use serde::{Deserialize, Serialize};

/// Trailing (DIP) configuration: fires on a drop from the maximum price in
/// retained history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailingRule {
    pub enabled: bool,
    pub threshold_percent: f64,
}

/// Rolling-window (SPIKE) configuration: fires on a rise from the minimum
/// price inside the trailing time window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RollingRule {
    pub enabled: bool,
    pub threshold_percent: f64,
    pub window_minutes: u64,
}

/// Per-subscriber alert configuration. Both variants are independent; both
/// enabled at once is "hybrid" mode, and each candidate an algorithm emits
/// carries its own cooldown key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertRule {
    pub trailing: TrailingRule,
    pub rolling: RollingRule,
}

impl Default for AlertRule {
    /// Fallback applied when a subscriber has no stored settings: trailing
    /// at 1% plus rolling at 2% over a 5-minute window.
    fn default() -> Self {
        Self {
            trailing: TrailingRule {
                enabled: true,
                threshold_percent: 1.0,
            },
            rolling: RollingRule {
                enabled: true,
                threshold_percent: 2.0,
                window_minutes: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_matches_documented_fallback() {
        let rule = AlertRule::default();

        assert!(rule.trailing.enabled);
        assert_eq!(rule.trailing.threshold_percent, 1.0);
        assert!(rule.rolling.enabled);
        assert_eq!(rule.rolling.threshold_percent, 2.0);
        assert_eq!(rule.rolling.window_minutes, 5);
    }

    #[test]
    fn rule_round_trips_through_json() {
        let rule = AlertRule {
            trailing: TrailingRule {
                enabled: false,
                threshold_percent: 3.5,
            },
            rolling: RollingRule {
                enabled: true,
                threshold_percent: 0.75,
                window_minutes: 15,
            },
        };

        let json = serde_json::to_string(&rule).unwrap();
        let back: AlertRule = serde_json::from_str(&json).unwrap();

        assert!(!back.trailing.enabled);
        assert_eq!(back.trailing.threshold_percent, 3.5);
        assert_eq!(back.rolling.window_minutes, 15);
    }
}
