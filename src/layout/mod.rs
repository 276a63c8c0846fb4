//! Page geometry, pagination and the debounced engine

mod engine;
pub mod geometry;
mod mapping;
mod pagination;

pub use engine::{
    ChangeSource, ContentHeightProvider, PaginationEngine, PaginationUpdate, DEFAULT_DEBOUNCE_MS,
};
pub use geometry::{PageGeometry, PageSetup, POINTS_PER_INCH};
pub use mapping::SpaceMapping;
pub use pagination::{paginate, sanitize_height, PageBreak, PaginationState, MAX_PAGES};
