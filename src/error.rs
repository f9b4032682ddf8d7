/// Errors returned by a decode call. Every variant is terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum MvtError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("geometry error: {0}")]
    Geometry(String),
}

impl MvtError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, MvtError::Configuration(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, MvtError::Decode(_))
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, MvtError::Geometry(_))
    }
}

pub type Result<T> = std::result::Result<T, MvtError>;

pub(crate) fn decode_err(msg: impl Into<String>) -> MvtError {
    MvtError::Decode(msg.into())
}

pub(crate) fn geometry_err(msg: impl Into<String>) -> MvtError {
    MvtError::Geometry(msg.into())
}
