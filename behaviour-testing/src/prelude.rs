//! Everything a behaviour test usually needs
//!
//! ```rust,ignore
//! use behaviour_testing::prelude::*;
//! ```

pub use crate::config::{BehaviourConfig, LogLevel};
pub use crate::error::{BehaviourError, FixtureError, LoggingError};
pub use crate::fixture::{Customization, Fixture, Synthesize, TestRng};
pub use crate::lifecycle::{AsyncBehaviour, BehaviourState, ExceptionMode, Thrown};
pub use crate::logging::{Layout, LoggingTarget, MemoryLog, TestLogger};

pub use anyhow::{anyhow, bail, Context, Result};
pub use async_trait::async_trait;
