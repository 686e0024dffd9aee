//! Protocol error types.
/// Errors raised at the wire/typed-value boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The value is not a JSON object and cannot be an action.
    #[error("action must be a JSON object, got: {0}")]
    NotAnObject(String),

    /// The object has no `kind` discriminator.
    #[error("action is missing the `kind` field")]
    MissingKind,

    /// A known kind whose payload does not match the expected shape.
    #[error("malformed `{kind}` action: {reason}")]
    MalformedAction {
        /// The `kind` discriminator of the offending value.
        kind: String,
        /// Why deserialization failed.
        reason: String,
    },

    /// Serialization of a typed action failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_object_display() {
        let err = ProtocolError::NotAnObject("42".into());
        assert_eq!(err.to_string(), "action must be a JSON object, got: 42");
    }

    #[test]
    fn missing_kind_display() {
        let err = ProtocolError::MissingKind;
        assert_eq!(err.to_string(), "action is missing the `kind` field");
    }

    #[test]
    fn malformed_action_display() {
        let err = ProtocolError::MalformedAction {
            kind: "elementSelected".into(),
            reason: "bad field".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed `elementSelected` action: bad field"
        );
    }

    #[test]
    fn error_is_debug() {
        let err = ProtocolError::MissingKind;
        let debug = format!("{:?}", err);
        assert!(debug.contains("MissingKind"));
    }
}
