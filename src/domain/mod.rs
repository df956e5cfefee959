// Domain layer - Pure telemetry and device models
pub mod admin;
pub mod device;
pub mod selection;
pub mod sensor;
pub mod series;
pub mod telemetry;
