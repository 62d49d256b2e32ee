use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub title: String,
    pub occurs_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub title: String,
    pub occurs_at: DateTime<Utc>,
}

impl From<Activity> for ActivityEntry {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            title: activity.title,
            occurs_at: activity.occurs_at,
        }
    }
}

/// All activities falling on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub activities: Vec<ActivityEntry>,
}
