//! Service points: the stations visitors queue at.
//!
//! [`PointInput`] is the untrusted administrative payload. It is turned into
//! a [`PointSpec`] (trimmed, range-checked, defaults applied) before any
//! registry mutator sees it.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Defaults and limits
// ---------------------------------------------------------------------------

/// Average service time applied when the input omits it.
pub const DEFAULT_AVG_SERVICE_TIME_SEC: u32 = 60;
/// Queue capacity applied when the input omits it (`0` = unbounded).
pub const DEFAULT_MAX_QUEUE: u32 = 0;
/// Upper bound for a single visitor's service time (one day).
pub const MAX_AVG_SERVICE_TIME_SEC: i64 = 86_400;
/// Upper bound for a configured queue capacity.
pub const MAX_QUEUE_LIMIT: i64 = 100_000;
/// Maximum length of `name` and `sector`.
pub const MAX_LABEL_LEN: u64 = 120;
/// Maximum length of the free-text description.
pub const MAX_DESCRIPTION_LEN: u64 = 2_000;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A service point as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub id: DbId,
    pub name: String,
    pub sector: String,
    pub description: String,
    /// Always `> 0`.
    pub avg_service_time_sec: u32,
    /// `0` means the queue is unbounded.
    pub max_queue: u32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Point {
    /// Capacity of the queue, or `None` when unbounded.
    pub fn capacity(&self) -> Option<u32> {
        (self.max_queue > 0).then_some(self.max_queue)
    }

    /// Whether `queued` active tickets already fill the queue.
    pub fn is_full(&self, queued: usize) -> bool {
        self.capacity().is_some_and(|cap| queued >= cap as usize)
    }
}

// ---------------------------------------------------------------------------
// Administrative input
// ---------------------------------------------------------------------------

/// Untrusted create/update payload from the administrative surface.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PointInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = MAX_LABEL_LEN, message = "name is too long")
    )]
    pub name: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = MAX_LABEL_LEN, message = "sector is too long")
    )]
    pub sector: String,
    #[validate(length(max = MAX_DESCRIPTION_LEN, message = "description is too long"))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(
        min = 1,
        max = MAX_AVG_SERVICE_TIME_SEC,
        message = "avg_service_time_sec must be between 1 and 86400"
    ))]
    #[serde(default)]
    pub avg_service_time_sec: Option<i64>,
    #[validate(range(
        min = 0,
        max = MAX_QUEUE_LIMIT,
        message = "max_queue must be between 0 and 100000"
    ))]
    #[serde(default)]
    pub max_queue: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A validated point definition, ready for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSpec {
    pub name: String,
    pub sector: String,
    pub description: String,
    pub avg_service_time_sec: u32,
    pub max_queue: u32,
    /// `None` keeps the current flag on update and means `true` on create.
    pub is_active: Option<bool>,
}

impl PointInput {
    /// Validate and normalize the payload.
    ///
    /// Labels are trimmed; omitted numeric fields fall back to
    /// [`DEFAULT_AVG_SERVICE_TIME_SEC`] and [`DEFAULT_MAX_QUEUE`].
    pub fn into_spec(self) -> Result<PointSpec, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        // Ranges were checked above, the casts cannot truncate.
        let avg_service_time_sec = self
            .avg_service_time_sec
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_AVG_SERVICE_TIME_SEC);
        let max_queue = self
            .max_queue
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_MAX_QUEUE);

        Ok(PointSpec {
            name: self.name.trim().to_string(),
            sector: self.sector.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            avg_service_time_sec,
            max_queue,
            is_active: self.is_active,
        })
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn input(name: &str, sector: &str) -> PointInput {
        PointInput {
            name: name.to_string(),
            sector: sector.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_numbers_are_omitted() {
        let spec = input("Launch", "Sector 4").into_spec().unwrap();
        assert_eq!(spec.avg_service_time_sec, DEFAULT_AVG_SERVICE_TIME_SEC);
        assert_eq!(spec.max_queue, DEFAULT_MAX_QUEUE);
        assert_eq!(spec.description, "");
        assert_eq!(spec.is_active, None);
    }

    #[test]
    fn labels_are_trimmed() {
        let spec = input("  Launch  ", "\tSector 4 ").into_spec().unwrap();
        assert_eq!(spec.name, "Launch");
        assert_eq!(spec.sector, "Sector 4");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_matches!(
            input("   ", "Sector 1").into_spec(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn blank_sector_is_rejected() {
        assert_matches!(input("Launch", "").into_spec(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn zero_service_time_is_rejected() {
        let mut i = input("Launch", "Sector 4");
        i.avg_service_time_sec = Some(0);
        assert_matches!(i.into_spec(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_max_queue_is_rejected() {
        let mut i = input("Launch", "Sector 4");
        i.max_queue = Some(-1);
        assert_matches!(i.into_spec(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn explicit_values_are_kept() {
        let mut i = input("Launch", "Sector 4");
        i.avg_service_time_sec = Some(90);
        i.max_queue = Some(12);
        i.is_active = Some(false);
        let spec = i.into_spec().unwrap();
        assert_eq!(spec.avg_service_time_sec, 90);
        assert_eq!(spec.max_queue, 12);
        assert_eq!(spec.is_active, Some(false));
    }

    #[test]
    fn capacity_zero_means_unbounded() {
        let point = Point {
            id: 1,
            name: "Launch".into(),
            sector: "Sector 4".into(),
            description: String::new(),
            avg_service_time_sec: 60,
            max_queue: 0,
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(point.capacity(), None);
        assert!(!point.is_full(10_000));

        let bounded = Point { max_queue: 2, ..point };
        assert!(!bounded.is_full(1));
        assert!(bounded.is_full(2));
    }
}
