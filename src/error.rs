pub type BlendResult<T> = Result<T, BlendError>;

#[derive(thiserror::Error, Debug)]
pub enum BlendError {
    #[error("context error: {0}")]
    Context(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlendError {
    pub fn context(msg: impl Into<String>) -> Self {
        Self::Context(msg.into())
    }
}
