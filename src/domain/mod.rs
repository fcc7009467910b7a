// Domain layer: provisioning-unit descriptors and the ports to the external engine.

pub mod model;
pub mod ports;
