use serde::Serializer;
use tracing::Level;

/// Parse a case-insensitive log level name
pub fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Serialize `tracing::Level` to a string
pub fn serialize_level<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
{
    let level_str = match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };

    serializer.serialize_str(level_str)
}
