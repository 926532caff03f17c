use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::coords::GeoCoordinate;
use crate::filters::Filters;

pub const MIN_PAGE: i64 = 1;
pub const MAX_PAGE: i64 = 10_000_000 - 1;
pub const MIN_PAGE_SIZE: i64 = 1;
pub const MAX_PAGE_SIZE: i64 = 100 - 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    #[error("page below minimum")]
    PageBelowMinimum,
    #[error("page above maximum")]
    PageAboveMaximum,
    #[error("page size below minimum")]
    PageSizeBelowMinimum,
    #[error("page size above maximum")]
    PageSizeAboveMaximum,
    #[error("sort invalid")]
    SortInvalid,
}

/// Checks run in a fixed order and the first failure wins.
pub fn validate_filters(f: &Filters) -> Result<(), FilterError> {
    if f.page < MIN_PAGE {
        return Err(FilterError::PageBelowMinimum);
    }
    if f.page > MAX_PAGE {
        return Err(FilterError::PageAboveMaximum);
    }
    if f.page_size < MIN_PAGE_SIZE {
        return Err(FilterError::PageSizeBelowMinimum);
    }
    if f.page_size > MAX_PAGE_SIZE {
        return Err(FilterError::PageSizeAboveMaximum);
    }
    if !f.sort_safelist.contains(&f.sort.as_str()) {
        return Err(FilterError::SortInvalid);
    }
    Ok(())
}

/// Collects per-field failures; the first message recorded for a field is kept.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn finish(self) -> Result<(), Validator> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn validate_course(
    v: &mut Validator,
    name: &str,
    location: &GeoCoordinate,
    website: Option<&str>,
) {
    v.check(!name.trim().is_empty(), "name", "must be provided");
    v.check(
        (-90.0..=90.0).contains(&location.latitude),
        "location.latitude",
        "must be between -90 and 90",
    );
    v.check(
        (-180.0..=180.0).contains(&location.longitude),
        "location.longitude",
        "must be between -180 and 180",
    );
    v.check(
        website.map_or(true, is_optional_uri),
        "website",
        "must be a valid URI",
    );
}

/// An empty string counts as "no website".
pub fn is_optional_uri(s: &str) -> bool {
    s.is_empty() || Url::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        Filters {
            page,
            page_size,
            sort: sort.to_string(),
            ..Filters::default()
        }
    }

    #[test]
    fn page_bounds() {
        assert_eq!(
            validate_filters(&filters(0, 20, "id")),
            Err(FilterError::PageBelowMinimum)
        );
        assert_eq!(
            validate_filters(&filters(10_000_000, 20, "id")),
            Err(FilterError::PageAboveMaximum)
        );
        assert_eq!(validate_filters(&filters(9_999_999, 20, "id")), Ok(()));
    }

    #[test]
    fn page_size_bounds() {
        assert_eq!(
            validate_filters(&filters(1, 0, "id")),
            Err(FilterError::PageSizeBelowMinimum)
        );
        assert_eq!(
            validate_filters(&filters(1, 100, "id")),
            Err(FilterError::PageSizeAboveMaximum)
        );
        assert_eq!(validate_filters(&filters(1, 99, "id")), Ok(()));
    }

    #[test]
    fn sort_must_be_safelisted() {
        assert_eq!(
            validate_filters(&filters(1, 20, "unknown")),
            Err(FilterError::SortInvalid)
        );
        assert_eq!(validate_filters(&filters(1, 20, "-name")), Ok(()));
    }

    #[test]
    fn accepts_defaults() {
        assert_eq!(validate_filters(&filters(1, 20, "id")), Ok(()));
    }

    #[test]
    fn first_failure_wins() {
        assert_eq!(
            validate_filters(&filters(0, 0, "unknown")),
            Err(FilterError::PageBelowMinimum)
        );
        assert_eq!(
            validate_filters(&filters(1, 500, "unknown")),
            Err(FilterError::PageSizeAboveMaximum)
        );
    }

    #[test]
    fn course_fields() {
        let mut v = Validator::new();
        validate_course(
            &mut v,
            "",
            &GeoCoordinate::new(91.0, -181.0),
            Some("not a uri"),
        );
        assert!(!v.is_valid());
        let keys: Vec<_> = v.errors().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["location.latitude", "location.longitude", "name", "website"]
        );

        let mut v = Validator::new();
        validate_course(
            &mut v,
            "Arthur's Seat",
            &GeoCoordinate::new(0.0, 0.0),
            Some("https://example.com/runs/arthurs-seat"),
        );
        assert!(v.finish().is_ok());
    }

    #[test]
    fn empty_website_is_absent() {
        assert!(is_optional_uri(""));
        assert!(is_optional_uri("http://localhost:4000"));
        assert!(!is_optional_uri("example.com"));
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        let mut v = Validator::new();
        validate_course(&mut v, "x", &GeoCoordinate::new(f64::NAN, 0.0), None);
        assert!(v.errors().contains_key("location.latitude"));
    }
}
