//! Shifts and rosters.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::identity::{LinkingId, VenueId};

/// Where a shift is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    /// Rostered.
    #[default]
    Scheduled,
    /// Acknowledged by the employee.
    Confirmed,
    /// Worked.
    Completed,
}

/// A rostered shift or rostered day off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier for the shift.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// The rostered employee.
    pub linking_id: LinkingId,
    /// The venue worked at.
    pub venue_id: VenueId,
    /// The day the shift starts.
    pub date: NaiveDate,
    /// Start time. Required unless the shift is a day off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    /// End time. Earlier than the start time means the shift ends the next day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// Role worked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Rostered day off.
    #[serde(default)]
    pub is_rdo: bool,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ShiftStatus,
}

impl Shift {
    /// Rostered hours, rounded to 2 decimal places.
    ///
    /// Days off are 0 hours. A shift whose end is before its start runs past
    /// midnight.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use repertoire_engine::identity::{LinkingId, VenueId};
    /// use repertoire_engine::models::{Shift, ShiftStatus};
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let shift = Shift {
    ///     id: Uuid::new_v4(),
    ///     linking_id: LinkingId::parse("EMP-2976-3088-100001").unwrap(),
    ///     venue_id: VenueId::parse("VEN-2976-30").unwrap(),
    ///     date: NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(),
    ///     start_time: NaiveTime::from_hms_opt(18, 0, 0),
    ///     end_time: NaiveTime::from_hms_opt(1, 30, 0),
    ///     role: None,
    ///     is_rdo: false,
    ///     notes: None,
    ///     status: ShiftStatus::Scheduled,
    /// };
    /// assert_eq!(shift.duration_hours().unwrap(), Decimal::new(75, 1));
    /// ```
    pub fn duration_hours(&self) -> EngineResult<Decimal> {
        if self.is_rdo {
            return Ok(Decimal::ZERO);
        }
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            return Err(EngineError::validation(
                "start_time",
                "start and end times are required for a working shift",
            ));
        };

        let mut elapsed = end - start;
        if elapsed < Duration::zero() {
            elapsed += Duration::days(1);
        }
        Ok((Decimal::from(elapsed.num_minutes()) / Decimal::from(60)).round_dp(2))
    }
}

/// Changes to apply to a shift. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftUpdate {
    /// New date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// New start time.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// New end time.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// New role.
    #[serde(default)]
    pub role: Option<String>,
    /// New day-off flag.
    #[serde(default)]
    pub is_rdo: Option<bool>,
    /// New notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

impl ShiftUpdate {
    fn apply(self, shift: &mut Shift) {
        if let Some(date) = self.date {
            shift.date = date;
        }
        if let Some(start) = self.start_time {
            shift.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            shift.end_time = Some(end);
        }
        if let Some(role) = self.role {
            shift.role = Some(role);
        }
        if let Some(is_rdo) = self.is_rdo {
            shift.is_rdo = is_rdo;
        }
        if let Some(notes) = self.notes {
            shift.notes = Some(notes);
        }
        if let Some(status) = self.status {
            shift.status = status;
        }
    }
}

/// One employee's shifts within a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeWeek {
    /// The employee.
    pub linking_id: LinkingId,
    /// Their shifts in date order.
    pub shifts: Vec<Shift>,
    /// Rostered hours across the week.
    pub total_hours: Decimal,
}

/// A venue's roster for one week, grouped by employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRoster {
    /// The venue.
    pub venue_id: VenueId,
    /// First day of the week.
    pub week_start: NaiveDate,
    /// Last day of the week.
    pub week_end: NaiveDate,
    /// Employees in linking ID order.
    pub employees: Vec<EmployeeWeek>,
    /// Rostered hours across all employees.
    pub total_hours: Decimal,
}

/// An in-memory set of shifts.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    shifts: HashMap<Uuid, Shift>,
}

fn check_range(start: NaiveDate, end: NaiveDate) -> EngineResult<()> {
    if end < start {
        return Err(EngineError::validation(
            "end_date",
            "end date cannot be before start date",
        ));
    }
    Ok(())
}

fn sorted(mut shifts: Vec<&Shift>) -> Vec<&Shift> {
    shifts.sort_by(|a, b| {
        (a.date, a.start_time, a.linking_id.as_str()).cmp(&(
            b.date,
            b.start_time,
            b.linking_id.as_str(),
        ))
    });
    shifts
}

impl Roster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shifts held.
    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    /// True when no shifts are held.
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Looks up a shift.
    pub fn get(&self, id: Uuid) -> Option<&Shift> {
        self.shifts.get(&id)
    }

    /// Adds a shift after checking its times.
    pub fn add_shift(&mut self, shift: Shift) -> EngineResult<Uuid> {
        shift.duration_hours()?;
        if self.shifts.contains_key(&shift.id) {
            return Err(EngineError::Duplicate {
                entity: "Shift".to_string(),
                id: shift.id.to_string(),
            });
        }
        let id = shift.id;
        self.shifts.insert(id, shift);
        Ok(id)
    }

    /// Applies an update. The shift is unchanged if the result would be invalid.
    pub fn update_shift(&mut self, id: Uuid, update: ShiftUpdate) -> EngineResult<&Shift> {
        let current = self.shifts.get(&id).ok_or_else(|| EngineError::NotFound {
            entity: "Shift".to_string(),
            id: id.to_string(),
        })?;

        let mut updated = current.clone();
        update.apply(&mut updated);
        updated.duration_hours()?;

        self.shifts.insert(id, updated);
        self.shifts.get(&id).ok_or_else(|| EngineError::NotFound {
            entity: "Shift".to_string(),
            id: id.to_string(),
        })
    }

    /// Removes a shift.
    pub fn delete_shift(&mut self, id: Uuid) -> EngineResult<Shift> {
        self.shifts.remove(&id).ok_or_else(|| EngineError::NotFound {
            entity: "Shift".to_string(),
            id: id.to_string(),
        })
    }

    /// A venue's shifts between two dates inclusive, optionally for one employee.
    pub fn venue_roster(
        &self,
        venue_id: &VenueId,
        start: NaiveDate,
        end: NaiveDate,
        linking_id: Option<&LinkingId>,
    ) -> EngineResult<Vec<&Shift>> {
        check_range(start, end)?;
        Ok(sorted(
            self.shifts
                .values()
                .filter(|s| &s.venue_id == venue_id)
                .filter(|s| s.date >= start && s.date <= end)
                .filter(|s| linking_id.is_none_or(|l| &s.linking_id == l))
                .collect(),
        ))
    }

    /// An employee's shifts between two dates inclusive, optionally at one venue.
    pub fn employee_shifts(
        &self,
        linking_id: &LinkingId,
        start: NaiveDate,
        end: NaiveDate,
        venue_id: Option<&VenueId>,
    ) -> EngineResult<Vec<&Shift>> {
        check_range(start, end)?;
        Ok(sorted(
            self.shifts
                .values()
                .filter(|s| &s.linking_id == linking_id)
                .filter(|s| s.date >= start && s.date <= end)
                .filter(|s| venue_id.is_none_or(|v| &s.venue_id == v))
                .collect(),
        ))
    }

    /// The seven days from `week_start`, grouped by employee with hours totalled.
    pub fn week_roster(&self, venue_id: &VenueId, week_start: NaiveDate) -> EngineResult<WeekRoster> {
        let week_end = week_start + Duration::days(6);
        let shifts = self.venue_roster(venue_id, week_start, week_end, None)?;

        let mut grouped: BTreeMap<&LinkingId, Vec<Shift>> = BTreeMap::new();
        for shift in shifts {
            grouped
                .entry(&shift.linking_id)
                .or_default()
                .push(shift.clone());
        }

        let mut employees = Vec::with_capacity(grouped.len());
        let mut total_hours = Decimal::ZERO;
        for (linking_id, shifts) in grouped {
            let mut hours = Decimal::ZERO;
            for shift in &shifts {
                hours += shift.duration_hours()?;
            }
            total_hours += hours;
            employees.push(EmployeeWeek {
                linking_id: linking_id.clone(),
                shifts,
                total_hours: hours,
            });
        }

        Ok(WeekRoster {
            venue_id: venue_id.clone(),
            week_start,
            week_end,
            employees,
            total_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn time(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn shift(employee: &str, venue: &str, day: u32, start: (u32, u32), end: (u32, u32)) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            linking_id: LinkingId::parse(employee).unwrap(),
            venue_id: VenueId::parse(venue).unwrap(),
            date: date(day),
            start_time: time(start.0, start.1),
            end_time: time(end.0, end.1),
            role: None,
            is_rdo: false,
            notes: None,
            status: ShiftStatus::Scheduled,
        }
    }

    const SAM: &str = "EMP-2976-3088-100001";
    const ALEX: &str = "EMP-2976-3087-100002";
    const MAIN: &str = "VEN-2976-30";
    const ANNEX: &str = "VEN-2976-41";

    #[test]
    fn test_duration_hours() {
        assert_eq!(shift(SAM, MAIN, 1, (9, 0), (17, 30)).duration_hours().unwrap(), dec("8.5"));
        assert_eq!(shift(SAM, MAIN, 1, (22, 0), (6, 0)).duration_hours().unwrap(), dec("8"));
        assert_eq!(shift(SAM, MAIN, 1, (9, 0), (9, 0)).duration_hours().unwrap(), Decimal::ZERO);
        assert_eq!(shift(SAM, MAIN, 1, (9, 0), (9, 20)).duration_hours().unwrap(), dec("0.33"));
    }

    #[test]
    fn test_rdo_has_no_hours_and_needs_no_times() {
        let mut s = shift(SAM, MAIN, 1, (9, 0), (17, 0));
        s.is_rdo = true;
        s.start_time = None;
        s.end_time = None;
        assert_eq!(s.duration_hours().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_working_shift_without_times_is_rejected() {
        let mut s = shift(SAM, MAIN, 1, (9, 0), (17, 0));
        s.end_time = None;
        let mut roster = Roster::new();
        assert!(matches!(roster.add_shift(s), Err(EngineError::Validation { .. })));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_add_update_delete() {
        let mut roster = Roster::new();
        let s = shift(SAM, MAIN, 1, (9, 0), (17, 0));
        let id = roster.add_shift(s.clone()).unwrap();
        assert!(matches!(roster.add_shift(s), Err(EngineError::Duplicate { .. })));

        let updated = roster
            .update_shift(
                id,
                ShiftUpdate {
                    end_time: time(15, 0),
                    status: Some(ShiftStatus::Confirmed),
                    ..ShiftUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.duration_hours().unwrap(), dec("6"));
        assert_eq!(updated.status, ShiftStatus::Confirmed);

        roster.delete_shift(id).unwrap();
        assert!(matches!(roster.delete_shift(id), Err(EngineError::NotFound { .. })));
        assert!(matches!(
            roster.update_shift(id, ShiftUpdate::default()),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_venue_and_employee_filters() {
        let mut roster = Roster::new();
        roster.add_shift(shift(SAM, MAIN, 2, (9, 0), (17, 0))).unwrap();
        roster.add_shift(shift(SAM, ANNEX, 3, (9, 0), (17, 0))).unwrap();
        roster.add_shift(shift(ALEX, MAIN, 1, (9, 0), (17, 0))).unwrap();
        roster.add_shift(shift(ALEX, MAIN, 20, (9, 0), (17, 0))).unwrap();

        let main = VenueId::parse(MAIN).unwrap();
        let sam = LinkingId::parse(SAM).unwrap();

        let venue = roster.venue_roster(&main, date(1), date(7), None).unwrap();
        assert_eq!(venue.len(), 2);
        assert_eq!(venue[0].date, date(1));

        let only_sam = roster.venue_roster(&main, date(1), date(7), Some(&sam)).unwrap();
        assert_eq!(only_sam.len(), 1);

        assert_eq!(roster.employee_shifts(&sam, date(1), date(7), None).unwrap().len(), 2);
        assert_eq!(
            roster.employee_shifts(&sam, date(1), date(7), Some(&main)).unwrap().len(),
            1
        );
        assert!(roster.venue_roster(&main, date(7), date(1), None).is_err());
    }

    #[test]
    fn test_week_roster_groups_by_employee() {
        let mut roster = Roster::new();
        roster.add_shift(shift(SAM, MAIN, 1, (9, 0), (17, 0))).unwrap();
        roster.add_shift(shift(SAM, MAIN, 2, (22, 0), (2, 0))).unwrap();
        roster.add_shift(shift(ALEX, MAIN, 3, (10, 0), (15, 30))).unwrap();
        roster.add_shift(shift(ALEX, MAIN, 8, (10, 0), (15, 0))).unwrap();

        let week = roster
            .week_roster(&VenueId::parse(MAIN).unwrap(), date(1))
            .unwrap();

        assert_eq!(week.week_end, date(7));
        assert_eq!(week.employees.len(), 2);
        assert_eq!(week.employees[0].linking_id.as_str(), ALEX);
        assert_eq!(week.employees[0].total_hours, dec("5.5"));
        assert_eq!(week.employees[1].shifts.len(), 2);
        assert_eq!(week.employees[1].total_hours, dec("12"));
        assert_eq!(week.total_hours, dec("17.5"));
    }
}
