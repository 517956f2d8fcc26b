//! Time scales, precisions and navigation.
//!
//! A scale (day, week, month, year) fixes the window length and the coarse
//! column unit. A precision (`hour:quarter`, `day:half`, ...) fixes the
//! snapping step used by drag and resize. `TimeScaleConfig` holds the
//! navigation state; `TimeGrid` is the computed column layout.
//!
//! | Scale | Window | Column | Precisions |
//! |-------|--------|--------|------------|
//! | day | 1 day | hour | `hour:full`, `hour:half`, `hour:quarter` |
//! | week | 7 days | day | `day:full`, `day:half` |
//! | month | calendar month | day | `day:full`, `day:half` |
//! | year | calendar year | month | `month:full` |

mod grid;

pub use grid::TimeGrid;

use chrono::{Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GanttError, GanttResult};
use crate::models::Timestamp;

/// Top-level zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Scale {
    /// Unit of one coarse column.
    pub fn column_unit(self) -> TimeUnit {
        match self {
            Self::Day => TimeUnit::Hour,
            Self::Week | Self::Month => TimeUnit::Day,
            Self::Year => TimeUnit::Month,
        }
    }

    /// Precision used when none is configured.
    pub fn default_precision(self) -> Precision {
        Precision::new(self.column_unit(), Fraction::Full)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        })
    }
}

/// Calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Day,
    Month,
}

/// Subdivision of a precision unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fraction {
    Full,
    Half,
    Quarter,
}

impl Fraction {
    /// Steps per unit.
    pub fn subdivisions(self) -> u32 {
        match self {
            Self::Full => 1,
            Self::Half => 2,
            Self::Quarter => 4,
        }
    }
}

/// Snapping granularity, written `unit:fraction` (e.g. `hour:quarter`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Precision {
    pub unit: TimeUnit,
    pub fraction: Fraction,
}

impl Precision {
    pub fn new(unit: TimeUnit, fraction: Fraction) -> Self {
        Self { unit, fraction }
    }

    /// Steps per column.
    #[inline]
    pub fn subdivisions(&self) -> u32 {
        self.fraction.subdivisions()
    }

    /// Fixed length of one step; `None` for calendar months.
    pub fn step_duration(&self) -> Option<TimeDelta> {
        let unit_minutes = match self.unit {
            TimeUnit::Hour => 60,
            TimeUnit::Day => 24 * 60,
            TimeUnit::Month => return None,
        };
        Some(TimeDelta::minutes(
            unit_minutes / i64::from(self.subdivisions()),
        ))
    }

    /// Whether this precision is offered for `scale`.
    pub fn is_allowed_for(&self, scale: Scale) -> bool {
        match scale {
            Scale::Day => self.unit == TimeUnit::Hour,
            Scale::Week | Scale::Month => {
                self.unit == TimeUnit::Day && self.fraction != Fraction::Quarter
            }
            Scale::Year => self.unit == TimeUnit::Month && self.fraction == Fraction::Full,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Month => "month",
        };
        let fraction = match self.fraction {
            Fraction::Full => "full",
            Fraction::Half => "half",
            Fraction::Quarter => "quarter",
        };
        write!(f, "{unit}:{fraction}")
    }
}

impl FromStr for Precision {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (unit, fraction) = s.split_once(':').unwrap_or((s, "full"));
        let unit = match unit {
            "hour" => TimeUnit::Hour,
            "day" => TimeUnit::Day,
            "month" => TimeUnit::Month,
            other => return Err(GanttError::Config(format!("unknown precision unit '{other}'"))),
        };
        let fraction = match fraction {
            "full" => Fraction::Full,
            "half" => Fraction::Half,
            "quarter" => Fraction::Quarter,
            other => {
                return Err(GanttError::Config(format!(
                    "unknown precision fraction '{other}'"
                )))
            }
        };
        Ok(Self::new(unit, fraction))
    }
}

impl TryFrom<String> for Precision {
    type Error = GanttError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Precision> for String {
    fn from(p: Precision) -> Self {
        p.to_string()
    }
}

/// Configured precision per scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecisionMap {
    pub day: Precision,
    pub week: Precision,
    pub month: Precision,
    pub year: Precision,
}

impl Default for PrecisionMap {
    fn default() -> Self {
        Self {
            day: Scale::Day.default_precision(),
            week: Scale::Week.default_precision(),
            month: Scale::Month.default_precision(),
            year: Scale::Year.default_precision(),
        }
    }
}

impl PrecisionMap {
    pub fn get(&self, scale: Scale) -> Precision {
        match scale {
            Scale::Day => self.day,
            Scale::Week => self.week,
            Scale::Month => self.month,
            Scale::Year => self.year,
        }
    }

    pub fn set(&mut self, scale: Scale, precision: Precision) {
        match scale {
            Scale::Day => self.day = precision,
            Scale::Week => self.week = precision,
            Scale::Month => self.month = precision,
            Scale::Year => self.year = precision,
        }
    }

    /// Checks every entry against its scale.
    pub fn validate(&self) -> GanttResult<()> {
        for scale in [Scale::Day, Scale::Week, Scale::Month, Scale::Year] {
            let precision = self.get(scale);
            if !precision.is_allowed_for(scale) {
                return Err(GanttError::InvalidPrecision { scale, precision });
            }
        }
        Ok(())
    }
}

/// Navigation state of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeScaleConfig {
    /// Active scale.
    pub scale: Scale,
    /// Precision per scale.
    pub precision: PrecisionMap,
    /// Date the window is anchored on.
    pub focus_date: NaiveDate,
    /// Session offset from UTC, in minutes.
    pub timezone_offset_minutes: i32,
    /// Shifts the anchored window by this many precision units.
    pub navigation_offset: i32,
    /// First day of the week view.
    pub week_start: Weekday,
}

impl Default for TimeScaleConfig {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            precision: PrecisionMap::default(),
            focus_date: Utc::now().date_naive(),
            timezone_offset_minutes: 0,
            navigation_offset: 0,
            week_start: Weekday::Mon,
        }
    }
}

impl TimeScaleConfig {
    /// Creates a config focused on `focus_date`.
    pub fn new(scale: Scale, focus_date: NaiveDate) -> Self {
        Self {
            scale,
            focus_date,
            ..Default::default()
        }
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset_minutes = minutes;
        self
    }

    pub fn with_precision(mut self, scale: Scale, precision: Precision) -> Self {
        self.precision.set(scale, precision);
        self
    }

    pub fn with_navigation_offset(mut self, offset: i32) -> Self {
        self.navigation_offset = offset;
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// Precision of the active scale.
    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision.get(self.scale)
    }

    /// Session timezone.
    pub fn tz(&self) -> GanttResult<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            GanttError::Config(format!(
                "timezone offset {} minutes out of range",
                self.timezone_offset_minutes
            ))
        })
    }

    /// Switches scale, keeping the focus date.
    pub fn with_scale(&self, scale: Scale) -> Self {
        Self {
            scale,
            ..self.clone()
        }
    }

    /// Moves the window one scale unit forward.
    pub fn next(&self) -> GanttResult<Self> {
        self.shifted(1)
    }

    /// Moves the window one scale unit back.
    pub fn previous(&self) -> GanttResult<Self> {
        self.shifted(-1)
    }

    /// Re-focuses on the local date of `now`.
    pub fn today(&self, now: Timestamp) -> GanttResult<Self> {
        let focus_date = now.with_timezone(&self.tz()?).date_naive();
        Ok(Self {
            focus_date,
            ..self.clone()
        })
    }

    fn shifted(&self, units: i64) -> GanttResult<Self> {
        let focus_date = match self.scale {
            Scale::Day => self.focus_date.checked_add_signed(TimeDelta::days(units)),
            Scale::Week => self.focus_date.checked_add_signed(TimeDelta::weeks(units)),
            Scale::Month => add_months(self.focus_date, units),
            Scale::Year => add_months(self.focus_date, units * 12),
        }
        .ok_or(GanttError::DateOutOfRange)?;
        Ok(Self {
            focus_date,
            ..self.clone()
        })
    }
}

/// Adds (or subtracts) calendar months, clamping the day of month.
pub(crate) fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(n)
    } else {
        date.checked_sub_months(n)
    }
}

/// Steps a local datetime by `n` calendar units.
pub(crate) fn step_local(ndt: NaiveDateTime, unit: TimeUnit, n: i64) -> Option<NaiveDateTime> {
    match unit {
        TimeUnit::Hour => ndt.checked_add_signed(TimeDelta::try_hours(n)?),
        TimeUnit::Day => ndt.checked_add_signed(TimeDelta::try_days(n)?),
        TimeUnit::Month => add_months(ndt.date(), n).map(|d| d.and_time(ndt.time())),
    }
}

/// First day of the week containing `date`.
pub(crate) fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - TimeDelta::days(i64::from(back))
}

/// Source of the current instant.
///
/// The grid asks for the time once per build so the today marker follows
/// day changes during long sessions.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
