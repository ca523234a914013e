//! Terminal rendering of plans and execution results

pub mod differ;
