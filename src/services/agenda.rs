use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::models::activity::{Activity, ActivityDay, ActivityEntry};

/// Buckets activities by the calendar date they fall on in `offset`.
///
/// Days come out in ascending date order. Inside a day, activities keep the
/// order they were handed in.
pub fn group_by_date(activities: Vec<Activity>, offset: FixedOffset) -> Vec<ActivityDay> {
    let mut days: BTreeMap<NaiveDate, Vec<ActivityEntry>> = BTreeMap::new();
    for activity in activities {
        let date = activity.occurs_at.with_timezone(&offset).date_naive();
        days.entry(date).or_default().push(activity.into());
    }
    days.into_iter()
        .map(|(date, activities)| ActivityDay { date, activities })
        .collect()
}
