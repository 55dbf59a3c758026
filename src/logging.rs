use crate::config::Env;
use env_logger::Env as LogEnv;
use std::fmt::{Display, Formatter, Result};

/// Installs env_logger. Development builds log at debug, production at warn.
/// RUST_LOG still overrides either default.
pub fn init(env: Env) {
    let default = match env {
        Env::Dev => "debug",
        Env::Prod => "warn",
    };
    env_logger::Builder::from_env(LogEnv::default().default_filter_or(default)).init();
}

/// Key/value pairs attached to a single log line.
///
/// A value is built per call and consumed by the `Display` impl, so nothing is
/// shared between concurrent requests logging at the same time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields(Vec<(&'static str, String)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Display) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Fields {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if value.is_empty() || value.contains(char::is_whitespace) {
                write!(f, "{}={:?}", key, value)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Fields;

    #[test]
    fn test_fields_display() {
        let fields = Fields::new()
            .with("met", "GET")
            .with("uri", "/~johndoe")
            .with("status", 200);
        assert_eq!(fields.to_string(), "met=GET uri=/~johndoe status=200");
    }

    #[test]
    fn test_fields_quote_empty_and_spaced() {
        let fields = Fields::new().with("handle", "").with("agent", "curl 7.0");
        assert_eq!(fields.to_string(), r#"handle="" agent="curl 7.0""#);
    }

    #[test]
    fn test_fields_are_independent() {
        let base = Fields::new().with("host", "littr.git");
        let a = base.clone().with("status", 200);
        let b = base.clone().with("status", 404);
        assert_eq!(base.to_string(), "host=littr.git");
        assert_ne!(a, b);
    }
}
