use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The kind of shift a staff member works on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftKind {
    Morning,
    Evening,
    DayOff,
}

impl ShiftKind {
    pub const ALL: [ShiftKind; 3] = [ShiftKind::Morning, ShiftKind::Evening, ShiftKind::DayOff];

    pub fn is_working(self) -> bool {
        !matches!(self, ShiftKind::DayOff)
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftKind::Morning => write!(f, "MORNING"),
            ShiftKind::Evening => write!(f, "EVENING"),
            ShiftKind::DayOff => write!(f, "DAY_OFF"),
        }
    }
}

/// One staff member's shift on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub staff_id: String,
    pub date: NaiveDate,
    pub shift: ShiftKind,
}

impl Assignment {
    pub fn new(staff_id: impl Into<String>, date: NaiveDate, shift: ShiftKind) -> Self {
        Self {
            staff_id: staff_id.into(),
            date,
            shift,
        }
    }
}
