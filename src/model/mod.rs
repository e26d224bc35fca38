pub mod cell;
pub mod labels;
pub mod thresholds;

#[cfg(test)]
#[path = "../../tests/src_inline/model/tests.rs"]
mod tests;
