use std::net::{IpAddr, SocketAddr};

/// Canonical client IP for a peer address (IPv4-mapped IPv6 unwrapped).
pub fn client_ip(addr: &SocketAddr) -> String {
    addr.ip().to_canonical().to_string()
}

/// Replace the last octet/segment of an address with `*`.
///
/// Anything that is not an IP address is returned unchanged.
pub fn mask_ip(ip: &str) -> String {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => match ip.rsplit_once('.') {
            Some((prefix, _)) => format!("{}.*", prefix),
            None => ip.to_string(),
        },
        Ok(IpAddr::V6(_)) => match ip.rsplit_once(':') {
            Some((prefix, _)) => format!("{}:*", prefix),
            None => ip.to_string(),
        },
        Err(_) => ip.to_string(),
    }
}

/// Loopback, private, link-local, unspecified and unique-local addresses.
pub fn is_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback() || v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_last_octet_and_segment() {
        assert_eq!(mask_ip("203.0.113.7"), "203.0.113.*");
        assert_eq!(mask_ip("2001:db8::1"), "2001:db8::*");
        assert_eq!(mask_ip("2001:db8:0:0:0:0:2:1"), "2001:db8:0:0:0:0:2:*");
        assert_eq!(mask_ip("::1"), "::*");
        assert_eq!(mask_ip("not-an-ip"), "not-an-ip");
    }

    #[test]
    fn canonicalizes_mapped_addresses() {
        let v4: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let mapped: SocketAddr = "[::ffff:203.0.113.7]:5000".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:5000".parse().unwrap();
        assert_eq!(client_ip(&v4), "127.0.0.1");
        assert_eq!(client_ip(&mapped), "203.0.113.7");
        assert_eq!(client_ip(&v6), "2001:db8::1");
    }

    #[test]
    fn detects_local_ranges() {
        for ip in ["127.0.0.1", "10.1.2.3", "172.16.0.9", "192.168.1.1", "169.254.0.1", "::1", "fd00::1", "fe80::1"] {
            assert!(is_local(&ip.parse().unwrap()), "{}", ip);
        }
        for ip in ["8.8.8.8", "172.32.0.1", "2001:db8::1"] {
            assert!(!is_local(&ip.parse().unwrap()), "{}", ip);
        }
    }
}
