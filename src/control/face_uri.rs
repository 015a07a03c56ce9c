//! Canonical forms of face URIs.
//!
//! A face is created from a remote URI such as `udp://192.0.2.1`. Before the
//! request reaches the forwarder the URI is rewritten to its canonical form:
//! IP transports name their address family and carry an explicit port, host
//! names are resolved and Ethernet addresses are lower-cased.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Port assumed when an IP face URI omits one.
pub const DEFAULT_NDN_PORT: u16 = 6363;

/// Reasons a face URI has no canonical form.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FaceUriError {
    /// The text is not `scheme://rest`, or `rest` does not fit the scheme.
    #[error("malformed face URI")]
    Malformed,
    /// The scheme names no known face type.
    #[error("unsupported face URI scheme {0:?}")]
    UnsupportedScheme(String),
    /// The port is not in 1..=65535.
    #[error("invalid port")]
    InvalidPort,
    /// The host resolves to no address usable by the scheme.
    #[error("cannot resolve host {0:?}")]
    Unresolvable(String),
    /// `udp4`/`tcp4` with an IPv6 address, or the reverse.
    #[error("address family does not match the scheme")]
    FamilyMismatch,
}

/// Return the canonical form of `uri`.
///
/// # Errors
///
/// Returns a [`FaceUriError`] naming why `uri` cannot be canonized.
pub async fn canonize(uri: &str) -> Result<String, FaceUriError> {
    let (scheme, rest) = uri.split_once("://").ok_or(FaceUriError::Malformed)?;
    match scheme {
        "udp" | "udp4" | "udp6" | "tcp" | "tcp4" | "tcp6" => canonize_ip(scheme, rest).await,
        "unix" if rest.len() > 1 && rest.starts_with('/') => Ok(uri.to_owned()),
        "ether" => canonize_ether(rest),
        "dev" if is_host_name(rest) => Ok(uri.to_owned()),
        "fd" if rest.parse::<u32>().is_ok() => Ok(uri.to_owned()),
        "internal" | "null" if rest.is_empty() => Ok(uri.to_owned()),
        "unix" | "dev" | "fd" | "internal" | "null" => Err(FaceUriError::Malformed),
        other => Err(FaceUriError::UnsupportedScheme(other.to_owned())),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Family {
    Any,
    V4,
    V6,
}

impl Family {
    fn admits(self, ip: IpAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4 => ip.is_ipv4(),
            Self::V6 => ip.is_ipv6(),
        }
    }
}

async fn canonize_ip(scheme: &str, rest: &str) -> Result<String, FaceUriError> {
    let (transport, suffix) = scheme.split_at(3);
    let family = match suffix {
        "4" => Family::V4,
        "6" => Family::V6,
        _ => Family::Any,
    };
    let (host, port) = split_host_port(rest.trim_end_matches('/'))?;
    let port = match port {
        Some(text) => text.parse::<u16>().map_err(|_| FaceUriError::InvalidPort)?,
        None => DEFAULT_NDN_PORT,
    };
    if port == 0 {
        return Err(FaceUriError::InvalidPort);
    }

    let ip = match host.parse::<IpAddr>() {
        Ok(ip) if family.admits(ip) => ip,
        Ok(_) => return Err(FaceUriError::FamilyMismatch),
        Err(_) => resolve(host, port, family).await?,
    };
    let version = if ip.is_ipv4() { 4 } else { 6 };
    Ok(format!("{transport}{version}://{}", SocketAddr::new(ip, port)))
}

/// Split `host[:port]` or `[v6]:port`.
fn split_host_port(authority: &str) -> Result<(&str, Option<&str>), FaceUriError> {
    let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or(FaceUriError::Malformed)?;
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':').ok_or(FaceUriError::Malformed)?)),
        }
    } else {
        match authority.split_once(':') {
            Some((_, port)) if port.contains(':') => return Err(FaceUriError::Malformed),
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };
    if host.is_empty() {
        return Err(FaceUriError::Malformed);
    }
    Ok((host, port))
}

async fn resolve(host: &str, port: u16, family: Family) -> Result<IpAddr, FaceUriError> {
    if !is_host_name(host) {
        return Err(FaceUriError::Malformed);
    }
    let unresolvable = || FaceUriError::Unresolvable(host.to_owned());
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| unresolvable())?
        .map(|addr| addr.ip())
        .find(|ip| family.admits(*ip))
        .ok_or_else(unresolvable)
}

fn is_host_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_'))
}

fn canonize_ether(rest: &str) -> Result<String, FaceUriError> {
    let address = rest
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .ok_or(FaceUriError::Malformed)?;
    let octets: Vec<&str> = address.split(':').collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.bytes().all(|b| b.is_ascii_hexdigit()));
    if !well_formed {
        return Err(FaceUriError::Malformed);
    }
    Ok(format!("ether://[{}]", address.to_ascii_lowercase()))
}
