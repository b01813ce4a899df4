//! Built-in triggers.

pub mod categories;
pub mod startdatedelay;

pub use categories::CategoriesTrigger;
pub use startdatedelay::StartDateDelayTrigger;
