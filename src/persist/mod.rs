pub mod error;
pub(crate) mod writer;
