pub mod adapter;
pub mod settings;
