//! File exports over repository output: JSON and CSV ticket dumps plus
//! a generated markdown summary.

pub mod export;
