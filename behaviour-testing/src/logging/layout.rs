//! Message layouts
//!
//! A layout is a template made of literal text and `${renderer}` tokens:
//!
//! | Renderer       | Output                                   |
//! |----------------|------------------------------------------|
//! | `${message}`   | the formatted log message                |
//! | `${level}`     | `ERROR`, `WARN`, `INFO`, `DEBUG`, `TRACE` |
//! | `${logger}`    | the logger name (record target)          |
//! | `${longdate}`  | `2024-05-01 13:37:00.123` (local time)   |
//! | `${shortdate}` | `2024-05-01`                             |
//! | `${time}`      | `13:37:00.123`                           |
//! | `${newline}`   | a line feed                              |

use crate::error::LoggingError;
use chrono::Local;
use log::Record;
use std::fmt::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Message,
    Level,
    Logger,
    LongDate,
    ShortDate,
    Time,
    Newline,
}

/// Parsed message layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    source: String,
    segments: Vec<Segment>,
}

impl Layout {
    /// Parse a layout template
    ///
    /// # Errors
    ///
    /// - `UnknownRenderer` for a `${name}` that is not in the table above
    /// - `UnterminatedRenderer` for a `${` without its closing brace
    pub fn parse(template: &str) -> Result<Self, LoggingError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or(LoggingError::UnterminatedRenderer(offset + start))?;

            let segment = match after[..end].trim().to_ascii_lowercase().as_str() {
                "message" => Segment::Message,
                "level" => Segment::Level,
                "logger" => Segment::Logger,
                "longdate" => Segment::LongDate,
                "shortdate" => Segment::ShortDate,
                "time" => Segment::Time,
                "newline" => Segment::Newline,
                _ => return Err(LoggingError::UnknownRenderer(after[..end].to_string())),
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);

            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// `${message}`: the message text with no prefix
    pub fn message_only() -> Self {
        Self {
            source: "${message}".to_string(),
            segments: vec![Segment::Message],
        }
    }

    /// The template this layout was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, record: &Record) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            // Writing into a String cannot fail
            let _ = match segment {
                Segment::Literal(text) => out.write_str(text),
                Segment::Message => write!(out, "{}", record.args()),
                Segment::Level => write!(out, "{}", record.level()),
                Segment::Logger => out.write_str(record.target()),
                Segment::LongDate => {
                    write!(out, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
                }
                Segment::ShortDate => write!(out, "{}", Local::now().format("%Y-%m-%d")),
                Segment::Time => write!(out, "{}", Local::now().format("%H:%M:%S%.3f")),
                Segment::Newline => out.write_char('\n'),
            };
        }
        out
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::message_only()
    }
}

impl FromStr for Layout {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn render(layout: &Layout, level: Level, target: &str, message: &str) -> String {
        layout.render(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(target)
                .build(),
        )
    }

    #[test]
    fn test_message_only() {
        let layout = Layout::message_only();
        assert_eq!(render(&layout, Level::Warn, "t", "hello"), "hello");
        assert_eq!(layout, Layout::parse("${message}").unwrap());
    }

    #[test]
    fn test_mixed_template() {
        let layout = Layout::parse("[${level}] ${logger}: ${message}!").unwrap();
        assert_eq!(
            render(&layout, Level::Error, "calc", "overflow"),
            "[ERROR] calc: overflow!"
        );
    }

    #[test]
    fn test_renderer_names_are_case_insensitive() {
        let layout = Layout::parse("${LEVEL}${newline}${ Message }").unwrap();
        assert_eq!(render(&layout, Level::Info, "t", "m"), "INFO\nm");
    }

    #[test]
    fn test_dates() {
        let layout = Layout::parse("${shortdate}|${time}|${longdate}").unwrap();
        let rendered = render(&layout, Level::Info, "t", "m");
        let parts: Vec<&str> = rendered.split('|').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), "2024-05-01".len());
        assert!(parts[2].starts_with(parts[0]));
    }

    #[test]
    fn test_literal_only() {
        let layout = Layout::parse("static text").unwrap();
        assert_eq!(render(&layout, Level::Info, "t", "ignored"), "static text");
    }

    #[test]
    fn test_unknown_renderer() {
        let err = Layout::parse("${message} ${callsite}").unwrap_err();
        assert!(matches!(err, LoggingError::UnknownRenderer(name) if name == "callsite"));
    }

    #[test]
    fn test_unterminated_renderer() {
        let err = Layout::parse("ok ${message").unwrap_err();
        assert!(matches!(err, LoggingError::UnterminatedRenderer(3)));
    }
}
