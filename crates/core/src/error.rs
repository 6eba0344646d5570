/// Result alias that carries the custom [`VizError`] type.
pub type Result<T> = std::result::Result<T, VizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// The effect registry has no constructor for the requested name.
    #[error("unknown effect `{name}`")]
    UnknownEffect { name: String },
    /// The plugin catalog has no visualizer with the requested id.
    #[error("unknown plugin `{id}`")]
    UnknownPlugin { id: String },
    /// A surface size with a zero dimension was requested.
    #[error("invalid surface size {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// `render_frame` was called before `initialize`.
    #[error("plugin `{id}` rendered before initialize")]
    NotInitialized { id: String },
    /// A node parameter or binding could not be applied.
    #[error("invalid parameter `{key}`: {reason}")]
    InvalidParameter { key: String, reason: String },
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_param(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for VizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_effect_names_the_effect() {
        let err = VizError::UnknownEffect {
            name: "Blur".to_string(),
        };
        assert_eq!(err.to_string(), "unknown effect `Blur`");
    }

    #[test]
    fn converts_from_strings() {
        let err: VizError = "boom".into();
        assert!(matches!(err, VizError::Message(ref m) if m == "boom"));
    }
}
