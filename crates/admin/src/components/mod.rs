//! Admin screen state.
//!
//! Screens hold the list a page shows, the current selection, and apply
//! deletes optimistically so the table updates before the backend answers.

pub mod list_screen;

pub use list_screen::{
    BannersResource, BulkDeleteReport, CouponsResource, CrudResource, ListScreen, ProductsResource,
};
