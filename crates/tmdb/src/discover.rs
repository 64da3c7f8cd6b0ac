//! Query parameters and discovery-query builders.

use std::collections::BTreeMap;

use {
    chrono::{Datelike, NaiveDate},
    serde::Serialize,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum vote count for genre recommendations.
pub const RECOMMENDATION_MIN_VOTES: u32 = 100;

/// Ordered key/value query string. Inserting an existing key replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    #[cfg(test)]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    PopularityDesc,
    ReleaseDateAsc,
}

impl SortBy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PopularityDesc => "popularity.desc",
            Self::ReleaseDateAsc => "primary_release_date.asc",
        }
    }
}

/// A filtered, sorted `discover/movie` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverQuery {
    params: QueryParams,
}

impl DiscoverQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.params.insert("sort_by", sort.as_str());
        self
    }

    #[must_use]
    pub fn released_from(mut self, date: NaiveDate) -> Self {
        self.params
            .insert("primary_release_date.gte", date.format(DATE_FORMAT));
        self
    }

    #[must_use]
    pub fn released_until(mut self, date: NaiveDate) -> Self {
        self.params
            .insert("primary_release_date.lte", date.format(DATE_FORMAT));
        self
    }

    #[must_use]
    pub fn release_year(mut self, year: i32) -> Self {
        self.params.insert("primary_release_year", year);
        self
    }

    /// Restrict to a release region; `None` leaves the query worldwide.
    #[must_use]
    pub fn region(mut self, region: Option<&str>) -> Self {
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            self.params.insert("region", region);
        }
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre_id: u32) -> Self {
        self.params.insert("with_genres", genre_id);
        self
    }

    #[must_use]
    pub fn min_vote_count(mut self, votes: u32) -> Self {
        self.params.insert("vote_count.gte", votes);
        self
    }

    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Movies released between the first and last day of `today`'s month,
    /// most popular first.
    #[must_use]
    pub fn releases_this_month(today: NaiveDate, region: Option<&str>) -> Self {
        let (first, last) = month_bounds(today);
        Self::new()
            .released_from(first)
            .released_until(last)
            .sort_by(SortBy::PopularityDesc)
            .region(region)
    }

    /// Movies releasing from `today` through December 31st of the same year,
    /// soonest first.
    #[must_use]
    pub fn upcoming_this_year(today: NaiveDate, region: Option<&str>) -> Self {
        Self::new()
            .release_year(today.year())
            .released_from(today)
            .released_until(year_end(today))
            .sort_by(SortBy::ReleaseDateAsc)
            .region(region)
    }

    /// Popular, reasonably voted movies of one genre.
    #[must_use]
    pub fn by_genre(genre_id: u32) -> Self {
        Self::new()
            .with_genre(genre_id)
            .min_vote_count(RECOMMENDATION_MIN_VOTES)
            .sort_by(SortBy::PopularityDesc)
    }
}

/// First and last day of the month containing `today`.
#[must_use]
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    let last = next_month.and_then(|d| d.pred_opt()).unwrap_or(today);
    (first, last)
}

/// December 31st of `today`'s year.
#[must_use]
pub fn year_end(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2024, 2, 15), date(2024, 2, 1), date(2024, 2, 29))]
    #[case(date(2023, 2, 15), date(2023, 2, 1), date(2023, 2, 28))]
    #[case(date(2024, 12, 31), date(2024, 12, 1), date(2024, 12, 31))]
    #[case(date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 31))]
    #[case(date(2024, 4, 30), date(2024, 4, 1), date(2024, 4, 30))]
    fn month_bounds_cover_whole_month(
        #[case] today: NaiveDate,
        #[case] first: NaiveDate,
        #[case] last: NaiveDate,
    ) {
        assert_eq!(month_bounds(today), (first, last));
    }

    #[test]
    fn releases_this_month_for_leap_february() {
        let q = DiscoverQuery::releases_this_month(date(2024, 2, 15), Some("ES"));
        let p = q.params();
        assert_eq!(p.get("primary_release_date.gte"), Some("2024-02-01"));
        assert_eq!(p.get("primary_release_date.lte"), Some("2024-02-29"));
        assert_eq!(p.get("sort_by"), Some("popularity.desc"));
        assert_eq!(p.get("region"), Some("ES"));
        assert_eq!(p.get("primary_release_year"), None);
    }

    #[test]
    fn upcoming_this_year_runs_from_today_to_year_end() {
        let q = DiscoverQuery::upcoming_this_year(date(2024, 10, 17), Some("ES"));
        let p = q.params();
        assert_eq!(p.get("primary_release_year"), Some("2024"));
        assert_eq!(p.get("primary_release_date.gte"), Some("2024-10-17"));
        assert_eq!(p.get("primary_release_date.lte"), Some("2024-12-31"));
        assert_eq!(p.get("sort_by"), Some("primary_release_date.asc"));
    }

    #[test]
    fn by_genre_filters_and_sorts() {
        let q = DiscoverQuery::by_genre(878);
        let p = q.params();
        assert_eq!(p.get("with_genres"), Some("878"));
        assert_eq!(p.get("vote_count.gte"), Some("100"));
        assert_eq!(p.get("sort_by"), Some("popularity.desc"));
        assert_eq!(p.get("region"), None);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn region_is_skipped_when_unset(#[case] region: Option<&str>) {
        let q = DiscoverQuery::new().region(region);
        assert!(q.params().is_empty());
    }

    #[test]
    fn query_params_insert_replaces_existing_key() {
        let mut params = QueryParams::new().with("language", "en-US");
        params.insert("language", "es-ES");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("language"), Some("es-ES"));
    }
}
