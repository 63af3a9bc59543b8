use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to a failure escaping subject construction or `when`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionMode {
    /// Re-raise after teardown
    #[default]
    Throw,
    /// Capture for later assertions, `execute` succeeds
    Record,
}

impl fmt::Display for ExceptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionMode::Throw => f.write_str("throw"),
            ExceptionMode::Record => f.write_str("record"),
        }
    }
}
