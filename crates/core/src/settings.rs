//! Process-wide admission settings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default SLA target shown next to ETAs.
pub const DEFAULT_SLA_TARGET_MIN: u32 = 15;

/// Upper bound for either setting.
const MAX_SETTING_VALUE: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Max concurrent active tickets per visitor across all points (`0` = unlimited).
    pub active_limit: u32,
    /// Target wait, in minutes, that ETAs are compared against.
    pub sla_target_min: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_limit: 0,
            sla_target_min: DEFAULT_SLA_TARGET_MIN,
        }
    }
}

impl Settings {
    /// The per-visitor limit, or `None` when unlimited.
    pub fn limit(&self) -> Option<u32> {
        (self.active_limit > 0).then_some(self.active_limit)
    }

    /// Whether a visitor already holding `held` active tickets may take another.
    pub fn allows_another(&self, held: usize) -> bool {
        self.limit().map_or(true, |limit| held < limit as usize)
    }

    pub fn within_sla(&self, eta_minutes: u32) -> bool {
        eta_minutes <= self.sla_target_min
    }
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub active_limit: Option<i64>,
    #[serde(default)]
    pub sla_target_min: Option<i64>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.active_limit.is_none() && self.sla_target_min.is_none()
    }

    /// Apply the patch on top of `current`, rejecting out-of-range values.
    pub fn apply(&self, current: Settings) -> Result<Settings, CoreError> {
        let mut next = current;
        if let Some(limit) = self.active_limit {
            next.active_limit = checked_setting(limit, 0, "active_limit")?;
        }
        if let Some(sla) = self.sla_target_min {
            next.sla_target_min = checked_setting(sla, 1, "sla_target_min")?;
        }
        Ok(next)
    }
}

fn checked_setting(value: i64, min: i64, name: &str) -> Result<u32, CoreError> {
    if !(min..=MAX_SETTING_VALUE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {min} and {MAX_SETTING_VALUE}, got {value}"
        )));
    }
    Ok(value as u32)
}
