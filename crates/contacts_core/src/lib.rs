//! Contact list state: the storage seam, the sort-aware live query and the
//! view-state reducer that merges both into one published snapshot.

pub mod query;
pub mod reducer;
pub mod store;
pub mod view_model;

pub use query::{QueryEmission, SortedContactQuery};
pub use reducer::{reduce, ContactEvent, ContactState, StoreCommand, Transition};
pub use store::{ContactStore, ContactStream};
pub use view_model::ContactViewModel;

#[cfg(test)]
#[path = "tests/fakes.rs"]
pub(crate) mod fakes;
