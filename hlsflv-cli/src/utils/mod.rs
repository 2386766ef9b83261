mod headers;
mod size;
mod time;

// Export utility functions
pub use self::headers::split_header;
pub use self::size::format_bytes;
pub use self::time::format_duration;
pub use self::time::parse_time;
