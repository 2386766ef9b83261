use tracing::warn;

/// Splits a header in "Name: Value" format
pub fn split_header(header_str: &str) -> Option<(&str, &str)> {
    let Some((name, value)) = header_str.split_once(':') else {
        warn!(
            "Invalid header format: '{}'. Expected 'Name: Value'",
            header_str
        );
        return None;
    };

    let name = name.trim();
    if name.is_empty() {
        warn!("Invalid header name in '{}'", header_str);
        return None;
    }
    Some((name, value.trim()))
}
