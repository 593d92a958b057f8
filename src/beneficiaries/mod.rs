//! Beneficiary record helpers.

pub mod utils;

pub use utils::{create_extras_and_pii_data, remove_spaces, split_coordinates, Coordinates};
