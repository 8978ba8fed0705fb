use thiserror::Error;

/// Errors surfaced by the graph core.
///
/// `Input` wraps a diagnostic from a text-format parser and is terminal for
/// the factory call that triggered it. `Logic` reports a precondition
/// violation at an accessor; the instance stays fully usable afterwards.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed input: {message}{}", position_suffix(.position))]
    Input {
        message: String,
        position: Option<usize>,
    },
    #[error("logic error: {0}")]
    Logic(String),
}

impl GraphError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            position: None,
        }
    }

    pub fn input_at(message: impl Into<String>, position: usize) -> Self {
        Self::Input {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }
}

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(offset) => format!(" (at offset {offset})"),
        None => String::new(),
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_carries_position_in_message() {
        let err = GraphError::input_at("unexpected token", 17);
        assert_eq!(
            err.to_string(),
            "malformed input: unexpected token (at offset 17)"
        );
    }

    #[test]
    fn logic_error_message() {
        let err = GraphError::logic("graph is not a molecule");
        assert_eq!(err.to_string(), "logic error: graph is not a molecule");
    }
}
