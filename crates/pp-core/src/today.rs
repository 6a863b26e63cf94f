//! Daily checklist and weekly progress
//!
//! Only daily actions with a title show up on the checklist. A day's
//! record maps item ids to done flags; ids of items that were since
//! removed from the plan are kept but no longer counted.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::plan::{ActionItem, Frequency};
use crate::profile::{monday_of_week, Profile, Realization};

/// Checkbox state and notes for one date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayRecord {
    pub done: BTreeMap<String, bool>,
    pub notes: String,
}

/// A checklist entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTask<'a> {
    pub block_title: &'a str,
    pub item: &'a ActionItem,
}

/// Done vs. total daily actions for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayProgress {
    pub done: usize,
    pub total: usize,
}

impl DayProgress {
    /// Fraction done in `0.0..=1.0`; zero when there is nothing to do
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

impl DayRecord {
    pub fn is_done(&self, id: &str) -> bool {
        self.done.get(id).copied().unwrap_or(false)
    }

    pub fn progress(&self, tasks: &[DailyTask<'_>]) -> DayProgress {
        DayProgress {
            done: tasks.iter().filter(|t| self.is_done(&t.item.id)).count(),
            total: tasks.len(),
        }
    }
}

/// Daily actions with a title, in block order
pub fn daily_tasks(realization: &Realization) -> Vec<DailyTask<'_>> {
    realization
        .action_blocks
        .iter()
        .flat_map(|block| {
            block
                .items
                .iter()
                .filter(|item| item.freq == Frequency::Daily && !item.title.trim().is_empty())
                .map(move |item| DailyTask {
                    block_title: block.title.as_str(),
                    item,
                })
        })
        .collect()
}

fn date_key(date: NaiveDate) -> String {
    date.to_string()
}

impl Profile {
    /// The record for `date`, or an empty one
    pub fn day(&self, date: NaiveDate) -> DayRecord {
        self.today
            .by_date
            .get(&date_key(date))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_done(&mut self, date: NaiveDate, id: &str, done: bool) {
        self.today
            .by_date
            .entry(date_key(date))
            .or_default()
            .done
            .insert(id.to_string(), done);
    }

    pub fn set_day_notes(&mut self, date: NaiveDate, notes: &str) {
        self.today.by_date.entry(date_key(date)).or_default().notes = notes.to_string();
    }

    /// Reset all checkboxes and notes for `date`
    pub fn clear_day(&mut self, date: NaiveDate) {
        self.today.by_date.insert(date_key(date), DayRecord::default());
    }

    pub fn day_progress(&self, date: NaiveDate) -> DayProgress {
        self.day(date).progress(&daily_tasks(&self.realization))
    }
}

/// Progress over the week starting at `week_start` (a Monday)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekProgress {
    pub week_start: NaiveDate,
    /// Monday..Sunday
    pub days: Vec<(NaiveDate, DayProgress)>,
    pub days_on_target: usize,
    pub daily_target: u32,
    pub weekly_target_days: u32,
}

impl WeekProgress {
    pub fn goal_met(&self) -> bool {
        self.days_on_target >= self.weekly_target_days as usize
    }

    pub fn total_done(&self) -> usize {
        self.days.iter().map(|(_, p)| p.done).sum()
    }
}

/// Weekly progress for the week containing `date`
///
/// A day is on target when at least `metrics.daily_target` of the
/// current daily actions are done. With a target of zero, a day only
/// counts once it has any actions at all.
pub fn week_progress(profile: &Profile, date: NaiveDate) -> WeekProgress {
    let week_start = monday_of_week(date);
    let tasks = daily_tasks(&profile.realization);
    let target = profile.metrics.daily_target as usize;

    let days: Vec<(NaiveDate, DayProgress)> = (0..7)
        .map(|offset| {
            let day = week_start + TimeDelta::days(offset);
            (day, profile.day(day).progress(&tasks))
        })
        .collect();
    let days_on_target = days
        .iter()
        .filter(|(_, p)| p.total > 0 && p.done >= target)
        .count();

    WeekProgress {
        week_start,
        days,
        days_on_target,
        daily_target: profile.metrics.daily_target,
        weekly_target_days: profile.metrics.weekly_target_days,
    }
}
