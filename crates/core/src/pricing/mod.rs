//! Pure pricing calculator - no I/O, everything it needs is passed in.

mod pricing_calculator;

pub use pricing_calculator::calculate_current_value;
