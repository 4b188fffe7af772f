// Application-layer boundaries shared by the pipeline and its adapters

pub mod ports;
