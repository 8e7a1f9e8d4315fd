//! Wake-on-LAN magic packets.
//!
//! Grounded on `examples/original_source/libguac/wol.c`: 6 bytes of
//! `0xFF` followed by the target MAC address repeated 16 times (102 bytes
//! total), sent as a UDP datagram to a broadcast or multicast address on
//! port 9.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::net::UdpSocket;

/// Size of a magic Wake-on-LAN packet: 6 synchronization bytes plus the
/// 6-byte MAC address repeated 16 times.
pub const PACKET_SIZE: usize = 102;

/// Default Wake-on-LAN UDP port.
pub const DEFAULT_PORT: u16 = 9;

/// A parsed 6-byte MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress([u8; 6]);

/// The MAC address text did not match `xx:xx:xx:xx:xx:xx` hex-colon form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseMacError;

impl std::fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAC address must be six colon-separated hex octets")
    }
}

impl std::error::Error for ParseMacError {}

impl std::str::FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or(ParseMacError)?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| ParseMacError)?;
        }
        if parts.next().is_some() {
            return Err(ParseMacError);
        }
        Ok(Self(octets))
    }
}

/// Builds the 102-byte magic packet for `mac`.
#[must_use]
pub fn magic_packet(mac: MacAddress) -> [u8; PACKET_SIZE] {
    let mut packet = [0xFFu8; PACKET_SIZE];
    for repeat in 0..16 {
        let start = 6 + repeat * 6;
        packet[start..start + 6].copy_from_slice(&mac.0);
    }
    packet
}

/// Sends a Wake-on-LAN magic packet for `mac` to `broadcast_addr` on
/// [`DEFAULT_PORT`].
///
/// # Errors
///
/// Returns any I/O error from binding the UDP socket, enabling broadcast,
/// or sending the datagram.
pub async fn wake(mac: MacAddress, broadcast_addr: IpAddr) -> std::io::Result<()> {
    let packet = magic_packet(mac);

    let socket = match broadcast_addr {
        IpAddr::V4(_) => {
            let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
            socket.set_broadcast(true)?;
            socket
        }
        IpAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0)).await?,
    };

    socket.send_to(&packet, (broadcast_addr, DEFAULT_PORT)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_hex_mac() {
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(mac.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn rejects_wrong_octet_count() {
        assert!("aa:bb:cc".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<MacAddress>().is_err());
    }

    #[test]
    fn packet_starts_with_six_ff_bytes_then_repeats_mac_sixteen_times() {
        let mac: MacAddress = "01:02:03:04:05:06".parse().unwrap();
        let packet = magic_packet(mac);
        assert_eq!(packet.len(), PACKET_SIZE);
        assert_eq!(&packet[0..6], &[0xFF; 6]);
        for repeat in 0..16 {
            let start = 6 + repeat * 6;
            assert_eq!(&packet[start..start + 6], &mac.0);
        }
    }

    #[tokio::test]
    async fn wake_sends_full_packet_to_target() {
        let receiver = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let target = receiver.local_addr().unwrap();

        let mac: MacAddress = "12:34:56:78:9a:bc".parse().unwrap();
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
        socket.send_to(&magic_packet(mac), target).await.unwrap();

        let mut buf = [0u8; PACKET_SIZE];
        let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(n, PACKET_SIZE);
        assert_eq!(&buf[0..6], &[0xFF; 6]);
    }
}
