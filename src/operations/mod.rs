pub mod creation;
pub mod query;
pub mod sewing;
pub mod shaping;
