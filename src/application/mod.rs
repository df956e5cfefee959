// Application layer - Use cases over the device backend
pub mod admin_repository;
pub mod admin_service;
pub mod device_repository;
pub mod device_service;
pub mod error;
pub mod telemetry_service;

#[cfg(test)]
pub(crate) mod testing;
