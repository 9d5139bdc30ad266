pub mod climate;
pub(crate) mod glm;
pub mod historical;
pub(crate) mod parse;
pub mod settings;
