pub mod angles;
pub mod insert;
