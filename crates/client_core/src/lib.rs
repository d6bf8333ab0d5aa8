//! Presentation-layer core.
//!
//! The client holds the full aggregated record set in memory and derives
//! everything the view shows (search, facets, sort, pagination, stats)
//! through pure functions over an explicit [`view::ViewState`]. The only
//! mutable client state is that struct plus the persisted bookmark set.

pub mod fetch;
pub mod view;

pub use fetch::ListingClient;
pub use view::{
    derive_view, facet_options, stats, FacetOptions, FacetSelection, ListingTab, PageView,
    SortOrder, Stats, ViewState,
};
