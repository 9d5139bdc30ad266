pub mod error;
pub(crate) mod fields;
pub(crate) mod glm;
pub(crate) mod timestamps;
