pub mod catalog;
pub mod filter;
pub mod repository;
pub mod time;

pub use catalog::{Catalog, CatalogData};
pub use filter::{BookingFilter, BookingSort, PropertyFilter, PropertySort};
pub use repository::{
    BookingRepository, MutationResponse, PropertyRepository, RecordRepository, RepositoryError,
};
pub use time::{Clock, ManualClock, SystemClock};
