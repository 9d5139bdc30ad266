pub mod nasa_power;
pub mod openmeteo;
pub mod silo;
