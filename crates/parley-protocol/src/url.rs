use crate::error::ProtocolError;

/// Turn a user-supplied server address into a WebSocket URL.
///
/// * `http://host:port` becomes `ws://host:port/ws` (likewise `https` → `wss`);
///   an explicit path on an http(s) URL is kept.
/// * `ws://` and `wss://` URLs pass through unchanged.
/// * A bare `host:port` is treated as `http://host:port`.
pub fn resolve_ws_url(input: &str) -> Result<String, ProtocolError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ProtocolError::InvalidUrl(input.to_string()));
    }

    let (scheme, rest) = match input.split_once("://") {
        Some((s, r)) => (s.to_ascii_lowercase(), r),
        None => ("http".to_string(), input),
    };

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ProtocolError::InvalidUrl(input.to_string()));
    }

    let (ws_scheme, from_http) = match scheme.as_str() {
        "ws" => ("ws", false),
        "wss" => ("wss", false),
        "http" => ("ws", true),
        "https" => ("wss", true),
        _ => return Err(ProtocolError::UnsupportedScheme(scheme)),
    };

    if !from_http {
        return Ok(format!("{ws_scheme}://{rest}"));
    }

    let has_path = rest
        .find('/')
        .map(|i| rest[i..].trim_end_matches('/'))
        .is_some_and(|p| !p.is_empty());

    if has_path {
        Ok(format!("{ws_scheme}://{rest}"))
    } else {
        Ok(format!("{ws_scheme}://{}/ws", rest.trim_end_matches('/')))
    }
}
