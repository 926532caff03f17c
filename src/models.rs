use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::GeoCoordinate;
use crate::validation::{validate_course, Validator};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Course {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub version: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: GeoCoordinate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Course {
    pub fn validate(&self) -> Result<(), Validator> {
        let mut v = Validator::new();
        validate_course(&mut v, &self.name, &self.location, self.website.as_deref());
        v.finish()
    }
}

/// Body of a create request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: GeoCoordinate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), Validator> {
        let mut v = Validator::new();
        validate_course(&mut v, &self.name, &self.location, self.website.as_deref());
        v.finish()
    }

    /// Empty description/website strings are stored as NULL.
    pub fn normalized(mut self) -> Self {
        self.description = non_empty(self.description);
        self.website = non_empty(self.website);
        self
    }
}

/// Body of a partial update. A missing key leaves the field as it is;
/// for the nullable fields an explicit `null` clears the value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CoursePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub location: Option<GeoCoordinate>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub website: Option<Option<String>>,
}

impl CoursePatch {
    pub fn apply(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name;
        }
        if let Some(description) = self.description {
            course.description = non_empty(description);
        }
        if let Some(location) = self.location {
            course.location = location;
        }
        if let Some(tags) = self.tags {
            course.tags = tags;
        }
        if let Some(website) = self.website {
            course.website = non_empty(website);
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}
