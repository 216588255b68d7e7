// Domain layer: plain data types and the ports the sync core talks through.

pub mod model;
pub mod ports;
