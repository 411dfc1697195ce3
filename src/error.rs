pub type GlowmoteResult<T> = Result<T, GlowmoteError>;

#[derive(thiserror::Error, Debug)]
pub enum GlowmoteError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("gesture error: {0}")]
    Gesture(String),

    #[error("emotion error: {0}")]
    Emotion(String),

    /// The engine was destroyed; the call was a no-op.
    #[error("engine destroyed")]
    Destroyed,

    /// Unrecoverable host-environment failure (audio context, GL context),
    /// surfaced at initialization time only.
    #[error("initialization error: {0}")]
    Init(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlowmoteError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn gesture(msg: impl Into<String>) -> Self {
        Self::Gesture(msg.into())
    }

    pub fn emotion(msg: impl Into<String>) -> Self {
        Self::Emotion(msg.into())
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            GlowmoteError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            GlowmoteError::gesture("x")
                .to_string()
                .contains("gesture error:")
        );
        assert!(
            GlowmoteError::emotion("x")
                .to_string()
                .contains("emotion error:")
        );
        assert!(GlowmoteError::init("x").to_string().contains("initialization error:"));
        assert_eq!(GlowmoteError::Destroyed.to_string(), "engine destroyed");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = GlowmoteError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
