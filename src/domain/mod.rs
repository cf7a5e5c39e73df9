// Domain layer: document model and ports. Depends only on serde and the config types it exposes.

pub mod model;
pub mod ports;
