pub mod calendar;
pub mod late_fee;

pub use calendar::{whole_days, whole_months};
pub use late_fee::{LateFeeAssessment, LateFeeEngine};
