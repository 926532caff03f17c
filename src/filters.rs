//! Paging and ordering parameters for list queries, and the metadata
//! returned alongside a page of results.

use serde::Serialize;

use crate::validation::FilterError;

/// Sort tokens accepted by the course listing.
pub const COURSE_SORT_SAFELIST: &[&str] = &["id", "name", "-id", "-name"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const DEFAULT_SORT: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
}

impl SortColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: DEFAULT_SORT.to_string(),
            sort_safelist: COURSE_SORT_SAFELIST,
        }
    }
}

impl Filters {
    /// Resolve the sort token to a column and direction.
    ///
    /// Only tokens present in the safelist resolve, and only to the
    /// columns named in [`SortColumn`]; caller text never reaches SQL.
    pub fn order_by(&self) -> Result<(SortColumn, SortDirection), FilterError> {
        if !self.sort_safelist.contains(&self.sort.as_str()) {
            return Err(FilterError::SortInvalid);
        }

        let (key, direction) = match self.sort.strip_prefix('-') {
            Some(key) => (key, SortDirection::Desc),
            None => (self.sort.as_str(), SortDirection::Asc),
        };

        let column = match key {
            "id" => SortColumn::Id,
            "name" => SortColumn::Name,
            _ => return Err(FilterError::SortInvalid),
        };

        Ok((column, direction))
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Page summary for a list response. All zero when nothing matched.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_by(sort: &str) -> Filters {
        Filters {
            sort: sort.to_string(),
            ..Filters::default()
        }
    }

    #[test]
    fn limit_and_offset() {
        let f = Filters {
            page: 3,
            page_size: 25,
            ..Filters::default()
        };
        assert_eq!(f.limit(), 25);
        assert_eq!(f.offset(), 50);

        assert_eq!(Filters::default().offset(), 0);
    }

    #[test]
    fn resolves_safelisted_sorts() {
        assert_eq!(
            sorted_by("id").order_by().unwrap(),
            (SortColumn::Id, SortDirection::Asc)
        );
        assert_eq!(
            sorted_by("-name").order_by().unwrap(),
            (SortColumn::Name, SortDirection::Desc)
        );
    }

    #[test]
    fn refuses_tokens_outside_the_safelist() {
        assert_eq!(
            sorted_by("name; DROP TABLE courses").order_by(),
            Err(FilterError::SortInvalid)
        );

        // Present in a caller-supplied safelist but with no column behind it.
        let f = Filters {
            sort: "website".to_string(),
            sort_safelist: &["website"],
            ..Filters::default()
        };
        assert_eq!(f.order_by(), Err(FilterError::SortInvalid));
    }

    #[test]
    fn empty_result_metadata_is_zeroed() {
        assert_eq!(calculate_metadata(0, 1, 20), Metadata::default());
    }

    #[test]
    fn metadata_rounds_last_page_up() {
        assert_eq!(
            calculate_metadata(195, 1, 20),
            Metadata {
                current_page: 1,
                page_size: 20,
                first_page: 1,
                last_page: 10,
                total_records: 195,
            }
        );
        assert_eq!(calculate_metadata(200, 2, 20).last_page, 10);
        assert_eq!(calculate_metadata(1, 1, 99).last_page, 1);
    }

    #[test]
    fn non_positive_page_size_yields_empty_metadata() {
        assert_eq!(calculate_metadata(5, 1, 0), Metadata::default());
        assert_eq!(calculate_metadata(5, 1, -3), Metadata::default());
    }

    #[test]
    fn page_past_the_end_is_not_clamped() {
        let m = calculate_metadata(5, 7, 20);
        assert_eq!(m.current_page, 7);
        assert_eq!(m.last_page, 1);
    }
}
