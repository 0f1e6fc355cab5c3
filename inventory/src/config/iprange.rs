//! Expansion of IP range and CIDR strings into individual addresses.
//! IPv4 only; every entry is capped at 10 000 addresses.

use crate::defaults::MAX_RANGE_IPS;
use common::error::InventoryError;
use std::collections::HashSet;
use std::net::Ipv4Addr;

fn parse_ipv4(value: &str) -> Result<Ipv4Addr, InventoryError> {
    value.trim().parse::<Ipv4Addr>().map_err(|_| {
        InventoryError::config("ip_range", &format!("invalid IPv4 address: {value}"))
    })
}

/// Parse a single address or an `a.b.c.d-e.f.g.h` range into addresses.
pub fn parse_ip_range(range: &str) -> Result<Vec<String>, InventoryError> {
    let range = range.trim();

    if !range.contains('-') {
        let addr = parse_ipv4(range)?;
        return Ok(vec![addr.to_string()]);
    }

    let (start_str, end_str) = match range.split_once('-') {
        Some(parts) => parts,
        None => {
            return Err(InventoryError::config(
                "ip_range",
                &format!("invalid IP range format (expected 'start-end'): {range}"),
            ))
        }
    };

    let start = u32::from(parse_ipv4(start_str)?);
    let end = u32::from(parse_ipv4(end_str)?);

    if start > end {
        return Err(InventoryError::config(
            "ip_range",
            &format!("start IP must be <= end IP: {range}"),
        ));
    }

    let count = (end - start) as usize + 1;
    if count > MAX_RANGE_IPS {
        return Err(InventoryError::config(
            "ip_range",
            &format!("IP range too large (max {MAX_RANGE_IPS} IPs): {range}"),
        ));
    }

    let mut addresses = Vec::with_capacity(count);
    for value in start..=end {
        addresses.push(Ipv4Addr::from(value).to_string());
    }

    Ok(addresses)
}

/// Parse CIDR notation into addresses. For prefixes shorter than /32 the
/// network and broadcast addresses are excluded.
pub fn parse_cidr(cidr: &str) -> Result<Vec<String>, InventoryError> {
    let cidr = cidr.trim();

    let (addr_str, prefix_str) = match cidr.split_once('/') {
        Some(parts) => parts,
        None => {
            return Err(InventoryError::config(
                "ip_range",
                &format!("invalid CIDR: {cidr}"),
            ))
        }
    };

    let addr = parse_ipv4(addr_str)?;
    let prefix: u32 = prefix_str.parse().map_err(|_| {
        InventoryError::config("ip_range", &format!("invalid CIDR prefix: {cidr}"))
    })?;
    if prefix > 32 {
        return Err(InventoryError::config(
            "ip_range",
            &format!("invalid CIDR prefix: {cidr}"),
        ));
    }

    let mask: u32 = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    let network = u32::from(addr) & mask;
    let broadcast = network | !mask;

    if prefix == 32 {
        return Ok(vec![Ipv4Addr::from(network).to_string()]);
    }

    let host_count = (broadcast - network) as usize + 1;
    // Network and broadcast addresses are dropped below
    if host_count.saturating_sub(2) > MAX_RANGE_IPS {
        return Err(InventoryError::config(
            "ip_range",
            &format!("CIDR range too large (max {MAX_RANGE_IPS} IPs): {cidr}"),
        ));
    }

    let mut addresses = Vec::new();
    for value in network..=broadcast {
        if value == network || value == broadcast {
            continue;
        }
        addresses.push(Ipv4Addr::from(value).to_string());
    }

    Ok(addresses)
}

/// Handle any host input format: single IP, range, or CIDR.
pub fn expand_host_input(input: &str) -> Result<Vec<String>, InventoryError> {
    let input = input.trim();
    if input.contains('/') {
        return parse_cidr(input);
    }
    parse_ip_range(input)
}

/// Expand a list of range entries, removing duplicates across entries
/// (first occurrence wins).
pub fn expand_ip_ranges(ranges: &[String]) -> Result<Vec<String>, InventoryError> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for range in ranges {
        for address in expand_host_input(range)? {
            if seen.insert(address.clone()) {
                addresses.push(address);
            }
        }
    }

    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::{expand_host_input, expand_ip_ranges, parse_cidr, parse_ip_range};

    #[test]
    fn test_single_address() {
        let ips = parse_ip_range("10.10.10.5").unwrap();
        assert_eq!(ips, vec!["10.10.10.5"]);
    }

    #[test]
    fn test_simple_range() {
        let ips = parse_ip_range("10.10.10.1-10.10.10.4").unwrap();
        assert_eq!(ips, vec!["10.10.10.1", "10.10.10.2", "10.10.10.3", "10.10.10.4"]);
    }

    #[test]
    fn test_range_crossing_octet() {
        let ips = parse_ip_range("10.0.0.254-10.0.1.1").unwrap();
        assert_eq!(ips, vec!["10.0.0.254", "10.0.0.255", "10.0.1.0", "10.0.1.1"]);
    }

    #[test]
    fn test_range_start_after_end() {
        let err = parse_ip_range("10.0.0.10-10.0.0.1").unwrap_err();
        assert!(err.to_string().contains("start IP must be <= end IP"));
    }

    #[test]
    fn test_range_invalid_address() {
        assert!(parse_ip_range("10.0.0.300").is_err());
        assert!(parse_ip_range("banana").is_err());
        assert!(parse_ip_range("10.0.0.1-banana").is_err());
    }

    #[test]
    fn test_range_exactly_at_limit() {
        // 10.0.0.0-10.0.39.15 is exactly 10 000 addresses
        let ips = parse_ip_range("10.0.0.0-10.0.39.15").unwrap();
        assert_eq!(ips.len(), 10_000);
    }

    #[test]
    fn test_range_too_large() {
        // one more than the limit
        let err = parse_ip_range("10.0.0.0-10.0.39.16").unwrap_err();
        assert!(err.to_string().contains("IP range too large"));
    }

    #[test]
    fn test_cidr_excludes_network_and_broadcast() {
        let ips = parse_cidr("192.168.1.0/30").unwrap();
        assert_eq!(ips, vec!["192.168.1.1", "192.168.1.2"]);
    }

    #[test]
    fn test_cidr_full_24() {
        let ips = parse_cidr("192.168.1.0/24").unwrap();
        assert_eq!(ips.len(), 254);
        assert_eq!(ips[0], "192.168.1.1");
        assert_eq!(ips[253], "192.168.1.254");
    }

    #[test]
    fn test_cidr_host_prefix() {
        let ips = parse_cidr("10.0.0.7/32").unwrap();
        assert_eq!(ips, vec!["10.0.0.7"]);
    }

    #[test]
    fn test_cidr_normalises_to_network() {
        // The address bits below the prefix are masked off
        let ips = parse_cidr("192.168.1.77/30").unwrap();
        assert_eq!(ips, vec!["192.168.1.77", "192.168.1.78"]);
    }

    #[test]
    fn test_cidr_invalid() {
        assert!(parse_cidr("192.168.1.0").is_err());
        assert!(parse_cidr("192.168.1.0/33").is_err());
        assert!(parse_cidr("banana/24").is_err());
    }

    #[test]
    fn test_cidr_too_large() {
        let err = parse_cidr("10.0.0.0/16").unwrap_err();
        assert!(err.to_string().contains("CIDR range too large"));
    }

    #[test]
    fn test_expand_host_input_dispatch() {
        assert_eq!(expand_host_input("10.0.0.1").unwrap().len(), 1);
        assert_eq!(expand_host_input("10.0.0.1-10.0.0.2").unwrap().len(), 2);
        assert_eq!(expand_host_input("10.0.0.0/30").unwrap().len(), 2);
    }

    #[test]
    fn test_expand_ranges_dedup() {
        let ranges = vec![
            String::from("10.0.0.1-10.0.0.3"),
            String::from("10.0.0.2-10.0.0.4"),
        ];
        let ips = expand_ip_ranges(&ranges).unwrap();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);
    }

    #[test]
    fn test_expand_ranges_propagates_error() {
        let ranges = vec![String::from("10.0.0.1"), String::from("bogus")];
        assert!(expand_ip_ranges(&ranges).is_err());
    }
}
