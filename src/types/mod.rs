pub mod adapter_state;
pub mod date_range;
pub mod error;
pub mod glm_table;
pub mod location;
pub mod met_data;
pub mod resolution;
