use std::any::Any;
use std::fmt;

/// A failure that escaped subject construction or `when`
///
/// Errors keep their original `anyhow::Error` so they can be downcast to the
/// concrete type the subject returned. Panics keep their payload.
pub enum Thrown {
    Error(anyhow::Error),
    Panic(Box<dyn Any + Send + 'static>),
}

impl Thrown {
    /// The error's display text, or the panic message
    pub fn message(&self) -> String {
        match self {
            Thrown::Error(error) => error.to_string(),
            Thrown::Panic(payload) => panic_message(payload.as_ref()),
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Thrown::Panic(_))
    }

    pub fn as_error(&self) -> Option<&anyhow::Error> {
        match self {
            Thrown::Error(error) => Some(error),
            Thrown::Panic(_) => None,
        }
    }

    /// Downcast a captured error to its concrete type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.as_error().and_then(|error| error.downcast_ref::<E>())
    }

    /// Whether a captured error is an `E`, looking through `.context(..)` wrappers
    pub fn is<E>(&self) -> bool
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.downcast_ref::<E>().is_some()
    }

    pub fn into_error(self) -> Option<anyhow::Error> {
        match self {
            Thrown::Error(error) => Some(error),
            Thrown::Panic(_) => None,
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Thrown::Panic(payload) => f
                .debug_tuple("Panic")
                .field(&panic_message(payload.as_ref()))
                .finish(),
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Error(error) => write!(f, "{:#}", error),
            Thrown::Panic(payload) => write!(f, "panic: {}", panic_message(payload.as_ref())),
        }
    }
}
