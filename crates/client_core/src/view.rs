use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared::domain::{Vacancy, VacancyId};

pub const DEFAULT_PER_PAGE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    FewestApplicants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingTab {
    #[default]
    All,
    Bookmarked,
}

/// Multi-value selections for the four filterable dimensions. An empty
/// set means "no constraint" for that facet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetSelection {
    pub provinces: BTreeSet<String>,
    pub regencies: BTreeSet<String>,
    pub companies: BTreeSet<String>,
    pub study_programs: BTreeSet<String>,
}

impl FacetSelection {
    pub fn matches(&self, vacancy: &Vacancy) -> bool {
        facet_ok(&self.provinces, &vacancy.company.province)
            && facet_ok(&self.regencies, &vacancy.company.regency)
            && facet_ok(&self.companies, &vacancy.company.name)
            && (self.study_programs.is_empty()
                || vacancy
                    .study_programs()
                    .iter()
                    .any(|program| self.study_programs.contains(&program.title)))
    }
}

fn facet_ok(selection: &BTreeSet<String>, value: &str) -> bool {
    selection.is_empty() || selection.contains(value)
}

/// The whole transient UI state, serializable so a shell can persist or
/// restore a session. All mutators that change what the list shows reset
/// the pagination cursor to page 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    pub search: String,
    pub facets: FacetSelection,
    pub sort: SortOrder,
    pub tab: ListingTab,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            facets: FacetSelection::default(),
            sort: SortOrder::default(),
            tab: ListingTab::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ViewState {
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn toggle_province(&mut self, value: &str) {
        toggle_value(&mut self.facets.provinces, value);
        self.page = 1;
    }

    pub fn toggle_regency(&mut self, value: &str) {
        toggle_value(&mut self.facets.regencies, value);
        self.page = 1;
    }

    pub fn toggle_company(&mut self, value: &str) {
        toggle_value(&mut self.facets.companies, value);
        self.page = 1;
    }

    pub fn toggle_study_program(&mut self, value: &str) {
        toggle_value(&mut self.facets.study_programs, value);
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_tab(&mut self, tab: ListingTab) {
        self.tab = tab;
        self.page = 1;
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

fn toggle_value(selection: &mut BTreeSet<String>, value: &str) {
    if !selection.remove(value) {
        selection.insert(value.to_string());
    }
}

/// One page of the filtered, sorted listing.
#[derive(Debug)]
pub struct PageView<'a> {
    pub items: Vec<&'a Vacancy>,
    pub filtered_total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// Records passing the search text, the active tab, and every facet.
pub fn filter<'a>(
    records: &'a [Vacancy],
    state: &ViewState,
    bookmarks: &BTreeSet<VacancyId>,
) -> Vec<&'a Vacancy> {
    let needle = state.search.trim().to_lowercase();
    records
        .iter()
        .filter(|vacancy| {
            let search_ok = needle.is_empty()
                || vacancy.position.to_lowercase().contains(&needle)
                || vacancy.company.name.to_lowercase().contains(&needle);
            let tab_ok = match state.tab {
                ListingTab::All => true,
                ListingTab::Bookmarked => bookmarks.contains(&vacancy.id),
            };
            search_ok && tab_ok && state.facets.matches(vacancy)
        })
        .collect()
}

/// Stable sort, so ties keep their aggregate (page) order. Records
/// without a timestamp sort as oldest.
pub fn sort(records: &mut [&Vacancy], order: SortOrder) {
    match order {
        SortOrder::Newest => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::FewestApplicants => records.sort_by_key(|vacancy| vacancy.registered),
    }
}

/// Slices one client-side page out of the filtered set. An out-of-range
/// cursor clamps to the last non-empty page (page 1 when empty).
pub fn paginate(records: Vec<&Vacancy>, page: usize, per_page: usize) -> PageView<'_> {
    let per_page = per_page.max(1);
    let page_count = records.len().div_ceil(per_page);
    let page = page.clamp(1, page_count.max(1));
    let start = (page - 1) * per_page;
    let items = records.iter().skip(start).take(per_page).copied().collect();
    PageView {
        items,
        filtered_total: records.len(),
        page,
        page_count,
    }
}

/// The full derivation pipeline: filter, then sort, then paginate.
pub fn derive_view<'a>(
    records: &'a [Vacancy],
    state: &ViewState,
    bookmarks: &BTreeSet<VacancyId>,
) -> PageView<'a> {
    let mut filtered = filter(records, state, bookmarks);
    sort(&mut filtered, state.sort);
    paginate(filtered, state.page, state.per_page)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FacetOptions {
    pub provinces: Vec<String>,
    pub regencies: Vec<String>,
    pub companies: Vec<String>,
    pub study_programs: Vec<String>,
}

/// Candidate values per facet, each narrowed by the selections of every
/// *other* facet (a facet never narrows itself, or a second value could
/// never be added to it).
pub fn facet_options(records: &[Vacancy], selection: &FacetSelection) -> FacetOptions {
    let without = |clear: fn(&mut FacetSelection)| {
        let mut others = selection.clone();
        clear(&mut others);
        others
    };

    FacetOptions {
        provinces: candidates(records, &without(|s| s.provinces.clear()), |v| {
            vec![v.company.province.clone()]
        }),
        regencies: candidates(records, &without(|s| s.regencies.clear()), |v| {
            vec![v.company.regency.clone()]
        }),
        companies: candidates(records, &without(|s| s.companies.clear()), |v| {
            vec![v.company.name.clone()]
        }),
        study_programs: candidates(records, &without(|s| s.study_programs.clear()), |v| {
            v.study_programs()
                .into_iter()
                .map(|program| program.title)
                .collect()
        }),
    }
}

fn candidates<F>(records: &[Vacancy], others: &FacetSelection, values_of: F) -> Vec<String>
where
    F: Fn(&Vacancy) -> Vec<String>,
{
    let mut unique = BTreeSet::new();
    for vacancy in records.iter().filter(|vacancy| others.matches(vacancy)) {
        for value in values_of(vacancy) {
            if !value.is_empty() {
                unique.insert(value);
            }
        }
    }
    unique.into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_vacancies: usize,
    pub total_applicants: i64,
    pub distinct_companies: usize,
}

/// Headline numbers over the unfiltered record set.
pub fn stats(records: &[Vacancy]) -> Stats {
    Stats {
        total_vacancies: records.len(),
        total_applicants: records.iter().map(|v| v.registered.max(0)).sum(),
        distinct_companies: records
            .iter()
            .map(|v| v.company.id)
            .collect::<BTreeSet<_>>()
            .len(),
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
