use crate::convert::error::ConversionError;
use crate::persist::error::PersistError;
use crate::transport::error::ProviderError;
use crate::types::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlmMetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}
