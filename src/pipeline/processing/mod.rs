// Pipeline processing: loading, normalization, validity, reconciliation, emission

pub mod parser;
pub mod normalize;
pub mod quality_gate;
pub mod conflation;
pub mod catalog;
