pub mod brackets;
pub mod matches;
