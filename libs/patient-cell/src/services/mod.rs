pub mod patient;
pub mod validation;

pub use patient::*;
pub use validation::*;
