//! Table-level access, one repository per table

pub mod cards;
pub mod mindmaps;
