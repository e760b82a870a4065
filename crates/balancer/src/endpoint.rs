//! Endpoint parsing shared by the forwarder, the probers and config
//! validation.

use reqwest::Url;

/// Parse a node endpoint as an absolute `http`/`https` URL with a host.
pub fn parse(endpoint: &str) -> Result<Url, String> {
    let url = Url::parse(endpoint).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Append `path` to the endpoint's base URL.
///
/// `http://host:1/` + `/put` gives `http://host:1/put`; a base path on the
/// endpoint is kept (`http://host:1/kv` + `/put` gives `http://host:1/kv/put`).
pub fn join(endpoint: &str, path: &str) -> Result<Url, String> {
    parse(&format!("{}{}", endpoint.trim_end_matches('/'), path))
}

/// Host and port to open a TCP connection to.
pub fn socket_target(endpoint: &str) -> Result<(String, u16), String> {
    let url = parse(endpoint)?;
    let host = url
        .host_str()
        .ok_or_else(|| "missing host".to_string())?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| "missing port".to_string())?;
    Ok((host, port))
}
