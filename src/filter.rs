// src/filter.rs
use crate::event::{Category, Event};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// === CATEGORY TABS ===
/// The active category tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Tabs in display order. Personal has no tab of its own.
    pub const TABS: [CategoryFilter; 4] = [
        CategoryFilter::All,
        CategoryFilter::Only(Category::Circle),
        CategoryFilter::Only(Category::JobHunting),
        CategoryFilter::Only(Category::University),
    ];

    /// Personal events pass every category filter.
    pub fn admits(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(active) => category == *active || category == Category::Personal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.label(),
        }
    }

    pub fn next(&self) -> CategoryFilter {
        let index = self.tab_index().map_or(0, |i| (i + 1) % Self::TABS.len());
        Self::TABS[index]
    }

    pub fn prev(&self) -> CategoryFilter {
        let len = Self::TABS.len();
        let index = self.tab_index().map_or(0, |i| (i + len - 1) % len);
        Self::TABS[index]
    }

    pub fn tab_index(&self) -> Option<usize> {
        Self::TABS.iter().position(|tab| tab == self)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Category>().map(CategoryFilter::Only)
    }
}

// === FACETS ===
/// Distinct non-empty types per category, plus the union of all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetMap {
    all: BTreeSet<String>,
    by_category: BTreeMap<Category, BTreeSet<String>>,
}

impl Default for FacetMap {
    fn default() -> Self {
        Self {
            all: BTreeSet::new(),
            by_category: Category::ALL.into_iter().map(|c| (c, BTreeSet::new())).collect(),
        }
    }
}

impl FacetMap {
    fn insert(&mut self, category: Category, event_type: &str) {
        self.by_category.entry(category).or_default().insert(event_type.to_string());
        self.all.insert(event_type.to_string());
    }

    fn set(&self, filter: CategoryFilter) -> Option<&BTreeSet<String>> {
        match filter {
            CategoryFilter::All => Some(&self.all),
            CategoryFilter::Only(category) => self.by_category.get(&category),
        }
    }

    /// Types to offer as chips under `filter`, in sorted order.
    pub fn types(&self, filter: CategoryFilter) -> Vec<String> {
        self.set(filter).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn contains(&self, filter: CategoryFilter, event_type: &str) -> bool {
        self.set(filter).is_some_and(|set| set.contains(event_type))
    }
}

pub fn derive_facets(events: &[Event]) -> FacetMap {
    let mut facets = FacetMap::default();
    for event in events {
        if let Some(event_type) = event.event_type() {
            facets.insert(event.category(), event_type);
        }
    }
    facets
}

/// Category filter first, then type filter; input order is kept.
/// With a non-empty `selected_types`, untyped events never pass.
pub fn apply_filters(
    events: &[Event],
    active: CategoryFilter,
    selected_types: &[String],
) -> Vec<Event> {
    events
        .iter()
        .filter(|event| active.admits(event.category()))
        .filter(|event| {
            selected_types.is_empty()
                || event
                    .event_type()
                    .is_some_and(|event_type| selected_types.iter().any(|s| s == event_type))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, category: Category, event_type: Option<&str>) -> Event {
        let event = Event::new(id.into(), id.into(), "2024-03-15T10:00:00Z".into(), category);
        match event_type {
            Some(t) => event.with_type(t),
            None => event,
        }
    }

    fn sample() -> Vec<Event> {
        vec![
            event("c1", Category::Circle, Some("practice")),
            event("j1", Category::JobHunting, Some("seminar")),
            event("u1", Category::University, None),
            event("p1", Category::Personal, Some("個人")),
            event("c2", Category::Circle, Some("")),
            event("j2", Category::JobHunting, Some("practice")),
        ]
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(Event::id).collect()
    }

    #[test]
    fn test_all_without_types_is_identity() {
        let events = sample();
        assert_eq!(apply_filters(&events, CategoryFilter::All, &[]), events);
    }

    #[test]
    fn test_category_filter_keeps_personal() {
        let events = sample();
        let filtered = apply_filters(&events, CategoryFilter::Only(Category::Circle), &[]);
        assert_eq!(ids(&filtered), vec!["c1", "p1", "c2"]);

        let filtered = apply_filters(&events, CategoryFilter::Only(Category::University), &[]);
        assert_eq!(ids(&filtered), vec!["u1", "p1"]);
    }

    #[test]
    fn test_type_filter_excludes_untyped() {
        let events = sample();
        let selected = vec!["practice".to_string()];

        let filtered = apply_filters(&events, CategoryFilter::All, &selected);
        assert_eq!(ids(&filtered), vec!["c1", "j2"]);

        let filtered =
            apply_filters(&events, CategoryFilter::Only(Category::JobHunting), &selected);
        assert_eq!(ids(&filtered), vec!["j2"]);
    }

    #[test]
    fn test_type_filter_applies_to_personal_too() {
        let events = sample();
        let selected = vec!["seminar".to_string(), "個人".to_string()];
        let filtered = apply_filters(&events, CategoryFilter::Only(Category::Circle), &selected);
        assert_eq!(ids(&filtered), vec!["p1"]);
    }

    #[test]
    fn test_derive_facets() {
        let facets = derive_facets(&sample());

        assert_eq!(facets.types(CategoryFilter::All), vec!["practice", "seminar", "個人"]);
        assert_eq!(facets.types(CategoryFilter::Only(Category::Circle)), vec!["practice"]);
        assert_eq!(
            facets.types(CategoryFilter::Only(Category::JobHunting)),
            vec!["practice", "seminar"]
        );
        assert!(facets.types(CategoryFilter::Only(Category::University)).is_empty());
        assert!(!facets.contains(CategoryFilter::All, ""));
        assert!(facets.contains(CategoryFilter::Only(Category::Personal), "個人"));
    }

    #[test]
    fn test_facets_of_empty_list() {
        let facets = derive_facets(&[]);
        assert_eq!(facets, FacetMap::default());
        for tab in CategoryFilter::TABS {
            assert!(facets.types(tab).is_empty());
        }
    }

    #[test]
    fn test_tab_cycling() {
        assert_eq!(CategoryFilter::All.next(), CategoryFilter::Only(Category::Circle));
        assert_eq!(CategoryFilter::Only(Category::University).next(), CategoryFilter::All);
        assert_eq!(CategoryFilter::All.prev(), CategoryFilter::Only(Category::University));
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "university".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::University))
        );
    }
}
