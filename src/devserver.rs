//! Human-friendly URLs for the dev server banner.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use console::style;
use tracing::debug;

pub const DEFAULT_PATHNAME: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUrls {
    /// Bare private LAN address, when one was found.
    pub lan_url_for_config: Option<String>,
    pub lan_url_for_terminal: Option<String>,
    pub local_url_for_terminal: String,
    pub local_url_for_browser: String,
}

/// Source of this machine's LAN address.
pub trait LanAddressProbe {
    fn lan_address(&self) -> Option<IpAddr>;
}

/// Finds the outbound IPv4 address by routing a UDP socket; no packets are sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpLanProbe;

impl LanAddressProbe for UdpLanProbe {
    fn lan_address(&self) -> Option<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .inspect_err(|error| debug!(error = %error, "LAN probe bind failed"))
            .ok()?;
        socket
            .connect((Ipv4Addr::new(10, 255, 255, 255), 1))
            .inspect_err(|error| debug!(error = %error, "LAN probe connect failed"))
            .ok()?;
        let address = socket.local_addr().ok()?.ip();
        (!address.is_unspecified()).then_some(address)
    }
}

/// Probe answering with a fixed address.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLanProbe(pub Option<IpAddr>);

impl LanAddressProbe for FixedLanProbe {
    fn lan_address(&self) -> Option<IpAddr> {
        self.0
    }
}

pub fn prepare_urls(
    protocol: &str,
    host: &str,
    port: u16,
    pathname: Option<&str>,
    probe: &impl LanAddressProbe,
) -> PreparedUrls {
    let pathname = normalize_pathname(pathname.unwrap_or(DEFAULT_PATHNAME));
    let is_unspecified_host = host == "0.0.0.0" || host == "::";

    let (pretty_host, lan_url_for_config, lan_url_for_terminal) = if is_unspecified_host {
        let lan = probe.lan_address().filter(is_private_lan_address);
        let lan_url_for_config = lan.map(|address| address.to_string());
        let lan_url_for_terminal = lan_url_for_config
            .as_deref()
            .map(|address| pretty_print_url(protocol, address, port, &pathname));
        ("localhost", lan_url_for_config, lan_url_for_terminal)
    } else {
        (host, None, None)
    };

    PreparedUrls {
        lan_url_for_config,
        lan_url_for_terminal,
        local_url_for_terminal: pretty_print_url(protocol, pretty_host, port, &pathname),
        local_url_for_browser: format_url(protocol, pretty_host, &port.to_string(), &pathname),
    }
}

/// RFC1918 private IPv4 ranges: 10/8, 172.16/12 and 192.168/16.
pub fn is_private_lan_address(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(address) => address.is_private(),
        IpAddr::V6(_) => false,
    }
}

fn pretty_print_url(protocol: &str, hostname: &str, port: u16, pathname: &str) -> String {
    let port = style(port).bold().to_string();
    format_url(protocol, hostname, &port, pathname)
}

fn format_url(protocol: &str, hostname: &str, port: &str, pathname: &str) -> String {
    let protocol = protocol.trim_end_matches(':');
    let hostname = if hostname.contains(':') && !hostname.starts_with('[') {
        format!("[{hostname}]")
    } else {
        hostname.to_owned()
    };
    format!("{protocol}://{hostname}:{port}{pathname}")
}

fn normalize_pathname(pathname: &str) -> String {
    if pathname.starts_with('/') {
        pathname.to_owned()
    } else {
        format!("/{pathname}")
    }
}
