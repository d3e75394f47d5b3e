#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CollageResult<T> = Result<T, CollageError>;

impl CollageError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CollageError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(CollageError::render("x").to_string().contains("render error:"));
        assert!(CollageError::asset("x").to_string().contains("asset error:"));
        assert!(
            CollageError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CollageError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
