//! Upload search: filtering, sorting, pagination and autocomplete.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yearbook_shared::constants::MIN_AUTOCOMPLETE_QUERY;
use yearbook_shared::{Actor, ParseError};

use crate::database::Database;
use crate::keys;
use crate::models::Upload;
use crate::session::Session;

/// How the active criteria of an [`UploadFilter`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FilterLogic {
    fn is_and(&self) -> bool {
        *self == FilterLogic::And
    }
}

/// Search criteria. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    /// Comma separated; every listed tag must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "FilterLogic::is_and")]
    pub logic: FilterLogic,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl UploadFilter {
    /// True when no criterion is set. The logic flag alone does not count.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let text = [
            ("school", &self.school),
            ("city", &self.city),
            ("country", &self.country),
            ("grade", &self.grade),
            ("tags", &self.tags),
            ("username", &self.username),
        ];
        for (name, value) in text {
            if let Some(v) = non_blank(value) {
                out.push((name, v.to_lowercase()));
            }
        }
        let numbers = [
            ("year", self.year),
            ("yearFrom", self.year_from),
            ("yearTo", self.year_to),
        ];
        for (name, value) in numbers {
            if let Some(v) = value {
                out.push((name, v.to_string()));
            }
        }
        out
    }

    /// Stable identity for de-duplicating searches: the non-empty fields,
    /// lowercased, sorted by name and joined as `name:value|...`.
    pub fn canonical_key(&self) -> String {
        let mut fields = self.fields();
        if self.logic == FilterLogic::Or && !fields.is_empty() {
            fields.push(("logic", "or".to_string()));
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

fn field_or_tag(upload: &Upload, field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle) || tag_contains(upload, needle)
}

fn tag_contains(upload: &Upload, needle: &str) -> bool {
    upload.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// One active criterion, pre-lowercased.
enum Criterion {
    School(String),
    City(String),
    Country(String),
    Year(i32),
    YearRange(Option<i32>, Option<i32>),
    Grade(String),
    Tags(Vec<String>),
    Owners(HashSet<Uuid>),
}

impl Criterion {
    fn matches(&self, upload: &Upload) -> bool {
        match self {
            Criterion::School(s) => field_or_tag(upload, &upload.school_name, s),
            Criterion::City(s) => field_or_tag(upload, &upload.city, s),
            Criterion::Country(s) => field_or_tag(upload, &upload.country, s),
            Criterion::Year(y) => upload.year == *y || tag_contains(upload, &y.to_string()),
            Criterion::YearRange(from, to) => {
                from.map_or(true, |f| upload.year >= f) && to.map_or(true, |t| upload.year <= t)
            }
            Criterion::Grade(g) => {
                upload
                    .grade
                    .as_deref()
                    .is_some_and(|grade| grade.trim().to_lowercase() == *g)
                    || tag_contains(upload, g)
            }
            Criterion::Tags(wanted) => wanted.iter().all(|w| tag_contains(upload, w)),
            Criterion::Owners(ids) => upload.uploaded_by.user_id().is_some_and(|id| ids.contains(&id)),
        }
    }
}

/// Orderings offered by the search page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortBy {
    /// Newest upload first.
    #[default]
    Date,
    Year,
    YearOldest,
    School,
    SchoolDesc,
    Views,
    Likes,
    Location,
}

impl SortBy {
    pub const ALL: [SortBy; 8] = [
        SortBy::Date,
        SortBy::Year,
        SortBy::YearOldest,
        SortBy::School,
        SortBy::SchoolDesc,
        SortBy::Views,
        SortBy::Likes,
        SortBy::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Year => "year",
            SortBy::YearOldest => "year-oldest",
            SortBy::School => "school",
            SortBy::SchoolDesc => "school-desc",
            SortBy::Views => "views",
            SortBy::Likes => "likes",
            SortBy::Location => "location",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SortBy::ALL
            .into_iter()
            .find(|o| o.as_str() == needle)
            .ok_or_else(|| ParseError::SortBy(s.to_string()))
    }
}

/// Sort in place. Ties keep their existing order.
pub fn sort_uploads(uploads: &mut [Upload], sort_by: SortBy) {
    match sort_by {
        SortBy::Date => uploads.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at)),
        SortBy::Year => uploads.sort_by(|a, b| b.year.cmp(&a.year)),
        SortBy::YearOldest => uploads.sort_by_key(|u| u.year),
        SortBy::School => uploads.sort_by_cached_key(|u| u.school_name.to_lowercase()),
        SortBy::SchoolDesc => {
            uploads.sort_by(|a, b| b.school_name.to_lowercase().cmp(&a.school_name.to_lowercase()))
        }
        SortBy::Views => uploads.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        SortBy::Likes => uploads.sort_by(|a, b| b.like_count.cmp(&a.like_count)),
        SortBy::Location => uploads.sort_by_cached_key(|u| u.location().to_lowercase()),
    }
}

/// One page of results. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let current_page = page.max(1);
    let total = items.len();
    let start = (current_page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        items: items[start..end].to_vec(),
        total,
        total_pages: total.div_ceil(per_page),
        current_page,
    }
}

/// Fields that offer autocomplete suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompleteField {
    School,
    City,
    Country,
}

impl AutocompleteField {
    fn value<'a>(&self, upload: &'a Upload) -> &'a str {
        match self {
            AutocompleteField::School => &upload.school_name,
            AutocompleteField::City => &upload.city,
            AutocompleteField::Country => &upload.country,
        }
    }
}

/// Split a header quick-search into words: the first names a school, the
/// second a city, the third a country. Extra words are ignored.
pub fn quick_query(query: &str) -> UploadFilter {
    let mut words = query.split_whitespace().map(str::to_string);
    UploadFilter {
        school: words.next(),
        city: words.next(),
        country: words.next(),
        ..UploadFilter::default()
    }
}

impl Database {
    /// Uploads the caller may see.
    pub fn visible_uploads(&self, viewer: &Actor) -> Vec<Upload> {
        self.load::<Upload>(keys::UPLOADS)
            .into_iter()
            .filter(|u| u.is_visible_to(viewer))
            .collect()
    }

    /// Filter the uploads visible to `session`. Result order is storage order.
    pub fn search_uploads(&self, session: &Session, filter: &UploadFilter) -> Vec<Upload> {
        let visible = self.visible_uploads(&session.actor());

        let mut criteria = Vec::new();
        if let Some(s) = non_blank(&filter.school) {
            criteria.push(Criterion::School(s.to_lowercase()));
        }
        if let Some(s) = non_blank(&filter.city) {
            criteria.push(Criterion::City(s.to_lowercase()));
        }
        if let Some(s) = non_blank(&filter.country) {
            criteria.push(Criterion::Country(s.to_lowercase()));
        }
        if let Some(y) = filter.year {
            criteria.push(Criterion::Year(y));
        }
        if filter.year_from.is_some() || filter.year_to.is_some() {
            criteria.push(Criterion::YearRange(filter.year_from, filter.year_to));
        }
        if let Some(g) = non_blank(&filter.grade) {
            criteria.push(Criterion::Grade(g.to_lowercase()));
        }
        if let Some(t) = non_blank(&filter.tags) {
            let wanted: Vec<String> = t
                .split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            if !wanted.is_empty() {
                criteria.push(Criterion::Tags(wanted));
            }
        }
        if let Some(name) = non_blank(&filter.username) {
            let ids: HashSet<Uuid> = self.user_ids_matching(name).into_iter().collect();
            if ids.is_empty() && filter.logic.is_and() {
                return Vec::new();
            }
            criteria.push(Criterion::Owners(ids));
        }

        if criteria.is_empty() {
            return visible;
        }

        visible
            .into_iter()
            .filter(|u| match filter.logic {
                FilterLogic::And => criteria.iter().all(|c| c.matches(u)),
                FilterLogic::Or => criteria.iter().any(|c| c.matches(u)),
            })
            .collect()
    }

    /// Search, sort and cut one page using the configured page size.
    pub fn browse(
        &self,
        session: &Session,
        filter: &UploadFilter,
        sort_by: SortBy,
        page: usize,
    ) -> Page<Upload> {
        let mut results = self.search_uploads(session, filter);
        sort_uploads(&mut results, sort_by);
        paginate(&results, page, self.config().results_per_page)
    }

    /// Previous and next upload around `id` in `filter`'s results, newest
    /// first. Both are `None` when `id` is not among the results.
    pub fn neighbors(
        &self,
        session: &Session,
        filter: &UploadFilter,
        id: Uuid,
    ) -> (Option<Uuid>, Option<Uuid>) {
        let mut results = self.search_uploads(session, filter);
        sort_uploads(&mut results, SortBy::Date);

        let Some(index) = results.iter().position(|u| u.id == id) else {
            return (None, None);
        };
        let previous = index.checked_sub(1).map(|i| results[i].id);
        let next = results.get(index + 1).map(|u| u.id);
        (previous, next)
    }

    /// Distinct values of `field` among visible uploads containing `query`.
    /// Values starting with the query come first.
    pub fn autocomplete(&self, session: &Session, field: AutocompleteField, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_AUTOCOMPLETE_QUERY {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut prefixed = Vec::new();
        let mut inner = Vec::new();
        for upload in self.visible_uploads(&session.actor()) {
            let value = field.value(&upload).trim();
            let lower = value.to_lowercase();
            if !lower.contains(&query) || !seen.insert(lower.clone()) {
                continue;
            }
            if lower.starts_with(&query) {
                prefixed.push(value.to_string());
            } else {
                inner.push(value.to_string());
            }
        }

        prefixed
            .into_iter()
            .chain(inner)
            .take(self.config().max_autocomplete_results)
            .collect()
    }
}
