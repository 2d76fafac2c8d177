pub type MaskweaveResult<T> = Result<T, MaskweaveError>;

#[derive(thiserror::Error, Debug)]
pub enum MaskweaveError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("compositor error: {0}")]
    Compositor(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskweaveError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}
