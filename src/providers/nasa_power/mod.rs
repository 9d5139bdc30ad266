pub mod power;
pub mod settings;
