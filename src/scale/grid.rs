//! Column grid and date/pixel mapping.
//!
//! # Coordinates
//! Columns are drawn with equal width, so the horizontal coordinate is
//! piecewise linear: `column_position(t) = index + fraction into column`.
//! A month of 31 days is 31 column units wide, a year is 12 regardless of
//! month lengths.

use chrono::{Datelike, DurationRound, FixedOffset, NaiveDateTime, TimeDelta, TimeZone, Utc};
use std::collections::BTreeMap;

use super::{step_local, week_start_of, Precision, Scale, TimeScaleConfig, TimeUnit};
use crate::error::{GanttError, GanttResult};
use crate::models::{Column, TimeSpan, Timestamp};

/// Computed column layout for one view cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    scale: Scale,
    precision: Precision,
    tz: FixedOffset,
    window: TimeSpan,
    columns: Vec<Column>,
}

fn to_utc(tz: &FixedOffset, local: NaiveDateTime) -> GanttResult<Timestamp> {
    tz.from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(GanttError::DateOutOfRange)
}

impl TimeGrid {
    /// Builds the grid for `config`, flagging the column containing `now`.
    pub fn build(config: &TimeScaleConfig, now: Timestamp) -> GanttResult<Self> {
        let scale = config.scale;
        let precision = config.precision();
        if !precision.is_allowed_for(scale) {
            return Err(GanttError::InvalidPrecision { scale, precision });
        }
        let tz = config.tz()?;
        let unit = scale.column_unit();

        let focus = config.focus_date;
        let (anchor, count) = match scale {
            Scale::Day => (focus, 24),
            Scale::Week => (week_start_of(focus, config.week_start), 7),
            Scale::Month => {
                let first = focus.with_day0(0).ok_or(GanttError::DateOutOfRange)?;
                let next = super::add_months(first, 1).ok_or(GanttError::DateOutOfRange)?;
                (first, (next - first).num_days() as usize)
            }
            Scale::Year => {
                let first = focus
                    .with_ordinal0(0)
                    .ok_or(GanttError::DateOutOfRange)?;
                (first, 12)
            }
        };

        let start = step_local(
            anchor.and_time(chrono::NaiveTime::MIN),
            unit,
            i64::from(config.navigation_offset),
        )
        .ok_or(GanttError::DateOutOfRange)?;

        let mut columns = Vec::with_capacity(count);
        let mut cursor = start;
        for index in 0..count {
            let next = step_local(cursor, unit, 1).ok_or(GanttError::DateOutOfRange)?;
            columns.push(Column::new(index, to_utc(&tz, cursor)?, to_utc(&tz, next)?));
            cursor = next;
        }

        let window = TimeSpan::new(columns[0].start, columns[count - 1].stop);
        let mut grid = Self {
            scale,
            precision,
            tz,
            window,
            columns,
        };
        grid.flag_today(now);
        log::debug!(
            "built {} grid: {} columns from {} to {}",
            scale,
            count,
            grid.window.start,
            grid.window.stop
        );
        Ok(grid)
    }

    /// Re-evaluates the today marker.
    pub fn flag_today(&mut self, now: Timestamp) {
        let today = self.column_at(now);
        for column in &mut self.columns {
            column.is_today = Some(column.index) == today;
        }
    }

    /// Applies unavailability marks (column index → unavailable).
    ///
    /// Columns without an entry stay available.
    pub fn mark_unavailable(&mut self, marks: &BTreeMap<usize, bool>) {
        for (&index, &unavailable) in marks {
            if let Some(column) = self.columns.get_mut(index) {
                column.is_unavailable = unavailable;
            }
        }
    }

    #[inline]
    pub fn scale(&self) -> Scale {
        self.scale
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[inline]
    pub fn tz(&self) -> FixedOffset {
        self.tz
    }

    /// Visible window.
    #[inline]
    pub fn window(&self) -> TimeSpan {
        self.window
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the column containing `t`, compared at minute granularity.
    pub fn column_at(&self, t: Timestamp) -> Option<usize> {
        let t = t.duration_trunc(TimeDelta::minutes(1)).unwrap_or(t);
        if !self.window.contains(t) {
            return None;
        }
        Some(self.columns.partition_point(|c| c.stop <= t))
    }

    /// Fractional column coordinate of `t`, clamped to `[0, len]`.
    pub fn column_position(&self, t: Timestamp) -> f64 {
        if t <= self.window.start {
            return 0.0;
        }
        if t >= self.window.stop {
            return self.columns.len() as f64;
        }
        let index = self.columns.partition_point(|c| c.stop <= t);
        let column = &self.columns[index];
        let into = (t - column.start).num_milliseconds() as f64;
        let width = (column.stop - column.start).num_milliseconds() as f64;
        index as f64 + into / width
    }

    /// Width of `[start, stop)` in column units.
    pub fn span_in_columns(&self, start: Timestamp, stop: Timestamp) -> f64 {
        self.column_position(stop) - self.column_position(start)
    }

    /// Pixel offset of `t` from the grid's left edge.
    pub fn to_pixel(&self, t: Timestamp, column_width_px: f64) -> f64 {
        self.column_position(t) * column_width_px
    }

    /// Instant under pixel offset `x` (clamped to the window).
    pub fn from_pixel(&self, x: f64, column_width_px: f64) -> Timestamp {
        let position = (x / column_width_px).clamp(0.0, self.columns.len() as f64);
        let index = position.floor() as usize;
        let Some(column) = self.columns.get(index) else {
            return self.window.stop;
        };
        let width = (column.stop - column.start).num_milliseconds() as f64;
        let offset = ((position - index as f64) * width).round() as i64;
        column.start + TimeDelta::milliseconds(offset)
    }

    /// Width in pixels of one precision step.
    pub fn snap_width_px(&self, column_width_px: f64) -> f64 {
        column_width_px / f64::from(self.precision.subdivisions())
    }

    /// Width in columns of one precision step (minimum pill width).
    pub fn step_in_columns(&self) -> f64 {
        1.0 / f64::from(self.precision.subdivisions())
    }

    /// Precision subdivisions of a column (advisory, for drag snapping).
    pub fn sub_columns(&self, index: usize) -> Option<Vec<TimeSpan>> {
        let column = self.columns.get(index)?;
        let steps = i64::from(self.precision.subdivisions());
        let width = (column.stop - column.start).num_milliseconds();
        let bounds: Vec<Timestamp> = (0..=steps)
            .map(|k| column.start + TimeDelta::milliseconds(width * k / steps))
            .collect();
        Some(
            bounds
                .windows(2)
                .map(|w| TimeSpan::new(w[0], w[1]))
                .collect(),
        )
    }

    /// Nearest precision boundary to `t` (clamped to the window).
    pub fn snap(&self, t: Timestamp) -> Timestamp {
        if t <= self.window.start {
            return self.window.start;
        }
        if t >= self.window.stop {
            return self.window.stop;
        }
        let column = &self.columns[self.columns.partition_point(|c| c.stop <= t)];
        let steps = i64::from(self.precision.subdivisions());
        let width = (column.stop - column.start).num_milliseconds();
        let into = (t - column.start).num_milliseconds();
        let k = ((into * steps) as f64 / width as f64).round() as i64;
        column.start + TimeDelta::milliseconds(width * k / steps)
    }

    /// Moves `t` by `steps` precision units.
    ///
    /// Month precision steps calendar months in the session timezone.
    pub fn shift(&self, t: Timestamp, steps: i64) -> GanttResult<Timestamp> {
        if steps == 0 {
            return Ok(t);
        }
        match self.precision.step_duration() {
            Some(step) => {
                let delta = step
                    .num_milliseconds()
                    .checked_mul(steps)
                    .and_then(TimeDelta::try_milliseconds)
                    .ok_or(GanttError::DateOutOfRange)?;
                t.checked_add_signed(delta).ok_or(GanttError::DateOutOfRange)
            }
            None => {
                let local = t.with_timezone(&self.tz).naive_local();
                let moved =
                    step_local(local, TimeUnit::Month, steps).ok_or(GanttError::DateOutOfRange)?;
                to_utc(&self.tz, moved)
            }
        }
    }

    /// Visible part of an interval; open-ended intervals reach the window stop.
    pub fn clamp(&self, start: Timestamp, stop: Option<Timestamp>) -> Option<TimeSpan> {
        let stop = stop.unwrap_or(self.window.stop);
        TimeSpan::new(start, stop).intersect(&self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{Fraction, TimeUnit};
    use chrono::{NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn december() -> TimeGrid {
        let cfg = TimeScaleConfig::new(Scale::Month, date(2018, 12, 20));
        TimeGrid::build(&cfg, utc(2018, 12, 20, 8, 0)).unwrap()
    }

    #[test]
    fn test_month_grid() {
        let grid = december();
        assert_eq!(grid.len(), 31);
        assert_eq!(grid.window().start, utc(2018, 12, 1, 0, 0));
        assert_eq!(grid.window().stop, utc(2019, 1, 1, 0, 0));
        // Contiguous
        for pair in grid.columns().windows(2) {
            assert_eq!(pair[0].stop, pair[1].start);
        }
        assert_eq!(grid.columns().iter().filter(|c| c.is_today).count(), 1);
        assert!(grid.columns()[19].is_today);
    }

    #[test]
    fn test_today_outside_window() {
        let cfg = TimeScaleConfig::new(Scale::Month, date(2018, 12, 20));
        let grid = TimeGrid::build(&cfg, utc(2019, 3, 1, 0, 0)).unwrap();
        assert!(grid.columns().iter().all(|c| !c.is_today));
    }

    #[test]
    fn test_day_week_year_grids() {
        let day = TimeGrid::build(
            &TimeScaleConfig::new(Scale::Day, date(2018, 12, 20)),
            utc(2018, 1, 1, 0, 0),
        )
        .unwrap();
        assert_eq!(day.len(), 24);
        assert_eq!(day.columns()[1].start, utc(2018, 12, 20, 1, 0));

        let week = TimeGrid::build(
            &TimeScaleConfig::new(Scale::Week, date(2018, 12, 20)).with_week_start(Weekday::Sun),
            utc(2018, 1, 1, 0, 0),
        )
        .unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week.window().start, utc(2018, 12, 16, 0, 0));

        let year = TimeGrid::build(
            &TimeScaleConfig::new(Scale::Year, date(2018, 12, 20)),
            utc(2018, 1, 1, 0, 0),
        )
        .unwrap();
        assert_eq!(year.len(), 12);
        assert_eq!(year.columns()[1].start, utc(2018, 2, 1, 0, 0));
        assert_eq!(year.window().stop, utc(2019, 1, 1, 0, 0));
    }

    #[test]
    fn test_timezone_offset_shifts_boundaries() {
        let cfg = TimeScaleConfig::new(Scale::Month, date(2018, 12, 20)).with_timezone_offset(60);
        let grid = TimeGrid::build(&cfg, utc(2018, 1, 1, 0, 0)).unwrap();
        // Local midnight at +01:00 is 23:00 UTC the day before
        assert_eq!(grid.window().start, utc(2018, 11, 30, 23, 0));
        assert_eq!(grid.column_at(utc(2018, 12, 19, 23, 30)), Some(19));
    }

    #[test]
    fn test_minute_granularity() {
        let grid = december();
        let edge = utc(2018, 12, 2, 0, 0);
        let just_before = edge - TimeDelta::seconds(30);
        let same_minute = just_before + TimeDelta::seconds(15);
        assert_eq!(grid.column_at(just_before), grid.column_at(same_minute));
        assert_eq!(grid.column_at(edge), Some(1));
    }

    #[test]
    fn test_navigation_offset_shifts_window() {
        let cfg = TimeScaleConfig::new(Scale::Month, date(2018, 12, 20)).with_navigation_offset(3);
        let grid = TimeGrid::build(&cfg, utc(2018, 1, 1, 0, 0)).unwrap();
        assert_eq!(grid.len(), 31);
        assert_eq!(grid.window().start, utc(2018, 12, 4, 0, 0));
    }

    #[test]
    fn test_column_position_and_pixels() {
        let grid = december();
        assert_eq!(grid.column_position(utc(2018, 12, 4, 12, 0)), 3.5);
        assert_eq!(grid.span_in_columns(utc(2018, 12, 1, 0, 0), utc(2018, 12, 4, 0, 0)), 3.0);
        assert_eq!(grid.to_pixel(utc(2018, 12, 3, 0, 0), 40.0), 80.0);
        assert_eq!(grid.from_pixel(100.0, 40.0), utc(2018, 12, 3, 12, 0));
        assert_eq!(grid.from_pixel(-5.0, 40.0), grid.window().start);
        assert_eq!(grid.from_pixel(1e9, 40.0), grid.window().stop);
    }

    #[test]
    fn test_year_positions_are_month_units() {
        let grid = TimeGrid::build(
            &TimeScaleConfig::new(Scale::Year, date(2018, 6, 1)),
            utc(2018, 1, 1, 0, 0),
        )
        .unwrap();
        assert_eq!(grid.span_in_columns(utc(2018, 2, 1, 0, 0), utc(2018, 3, 1, 0, 0)), 1.0);
        assert_eq!(grid.column_position(utc(2018, 2, 15, 0, 0)), 1.5);
    }

    #[test]
    fn test_snap_and_shift_quarter_hour() {
        let cfg = TimeScaleConfig::new(Scale::Day, date(2018, 12, 20))
            .with_precision(Scale::Day, Precision::new(TimeUnit::Hour, Fraction::Quarter));
        let grid = TimeGrid::build(&cfg, utc(2018, 1, 1, 0, 0)).unwrap();
        assert_eq!(grid.snap(utc(2018, 12, 20, 10, 8)), utc(2018, 12, 20, 10, 15));
        assert_eq!(grid.snap(utc(2018, 12, 20, 10, 7)), utc(2018, 12, 20, 10, 0));
        assert_eq!(
            grid.shift(utc(2018, 12, 20, 10, 0), -3).unwrap(),
            utc(2018, 12, 20, 9, 15)
        );
        assert_eq!(grid.snap_width_px(40.0), 10.0);
        assert_eq!(grid.sub_columns(10).unwrap().len(), 4);
        assert_eq!(grid.sub_columns(10).unwrap()[1].start, utc(2018, 12, 20, 10, 15));
    }

    #[test]
    fn test_shift_by_months() {
        let grid = TimeGrid::build(
            &TimeScaleConfig::new(Scale::Year, date(2018, 6, 1)).with_timezone_offset(60),
            utc(2018, 1, 1, 0, 0),
        )
        .unwrap();
        // 2018-01-31 23:00 UTC is Feb 1 00:00 local
        let t = utc(2018, 1, 31, 23, 0);
        assert_eq!(grid.shift(t, 1).unwrap(), utc(2018, 2, 28, 23, 0));
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let cfg = TimeScaleConfig::new(Scale::Month, date(2018, 12, 20))
            .with_precision(Scale::Month, Precision::new(TimeUnit::Hour, Fraction::Full));
        assert!(matches!(
            TimeGrid::build(&cfg, utc(2018, 1, 1, 0, 0)),
            Err(GanttError::InvalidPrecision { .. })
        ));
    }

    #[test]
    fn test_unavailability_marks() {
        let mut grid = december();
        let marks = BTreeMap::from([(0, true), (1, false), (99, true)]);
        grid.mark_unavailable(&marks);
        assert!(grid.columns()[0].is_unavailable);
        assert!(!grid.columns()[1].is_unavailable);
        assert!(!grid.columns()[2].is_unavailable);
    }

    #[test]
    fn test_clamp() {
        let grid = december();
        let span = grid.clamp(utc(2018, 11, 20, 0, 0), None).unwrap();
        assert_eq!(span, grid.window());
        assert!(grid.clamp(utc(2019, 2, 1, 0, 0), None).is_none());
    }
}
