//! MQTT 3.1.1 client packets: enough to connect, subscribe at QoS 0 and
//! receive publications.

use core::fmt;

use super::{BufferFull, Writer};

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4;
const CLEAN_SESSION: u8 = 0x02;
const MAX_REMAINING_LENGTH: usize = 268_435_455;

const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const PUBLISH: u8 = 0x30;
const SUBSCRIBE: u8 = 0x82;
const SUBACK: u8 = 0x90;
const PINGREQ: u8 = 0xC0;
const PINGRESP: u8 = 0xD0;
const DISCONNECT: u8 = 0xE0;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MqttError {
    BufferTooSmall,
    /// Remaining length uses more than four bytes.
    BadRemainingLength,
    /// Packet body does not match its type.
    Malformed,
    /// Broker refused the connection with this return code.
    Refused(u8),
    /// Broker rejected the subscription.
    SubscribeRejected,
}

impl From<BufferFull> for MqttError {
    fn from(_: BufferFull) -> Self {
        Self::BufferTooSmall
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("packet does not fit the buffer"),
            Self::BadRemainingLength => f.write_str("invalid remaining length"),
            Self::Malformed => f.write_str("malformed packet"),
            Self::Refused(code) => write!(f, "connection refused (code {})", code),
            Self::SubscribeRejected => f.write_str("subscription rejected"),
        }
    }
}

/// Packets a subscriber expects from the broker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Packet<'a> {
    ConnAck { session_present: bool, return_code: u8 },
    SubAck { packet_id: u16, granted_qos: u8 },
    Publish { topic: &'a str, payload: &'a [u8] },
    PingResp,
    /// Any other packet type, identified by its fixed-header byte.
    Other(u8),
}

impl Packet<'_> {
    /// Turns a CONNACK into a session result.
    pub fn connack_result(&self) -> Result<(), MqttError> {
        match *self {
            Self::ConnAck { return_code: 0, .. } => Ok(()),
            Self::ConnAck { return_code, .. } => Err(MqttError::Refused(return_code)),
            _ => Err(MqttError::Malformed),
        }
    }
}

fn put_remaining_length(writer: &mut Writer<'_>, mut len: usize) -> Result<(), MqttError> {
    if len > MAX_REMAINING_LENGTH {
        return Err(MqttError::BadRemainingLength);
    }
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        writer.put_u8(byte)?;
        if len == 0 {
            return Ok(());
        }
    }
}

fn put_string(writer: &mut Writer<'_>, text: &[u8]) -> Result<(), MqttError> {
    let len = u16::try_from(text.len()).map_err(|_| MqttError::BufferTooSmall)?;
    writer.put_u16(len)?;
    writer.put(text)?;
    Ok(())
}

/// Decodes the variable-length remaining length at the start of `bytes`.
///
/// Returns `(value, bytes used)`, or `None` if the field is incomplete.
pub fn decode_remaining_length(bytes: &[u8]) -> Result<Option<(usize, usize)>, MqttError> {
    let mut value = 0usize;
    for (index, byte) in bytes.iter().enumerate().take(4) {
        value |= usize::from(byte & 0x7F) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some((value, index + 1)));
        }
    }
    if bytes.len() >= 4 {
        Err(MqttError::BadRemainingLength)
    } else {
        Ok(None)
    }
}

/// CONNECT with a clean session and no credentials.
pub fn encode_connect(
    out: &mut [u8],
    client_id: &str,
    keep_alive_secs: u16,
) -> Result<usize, MqttError> {
    let remaining = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2 + 2 + client_id.len();
    let mut writer = Writer::new(out);
    writer.put_u8(CONNECT)?;
    put_remaining_length(&mut writer, remaining)?;
    put_string(&mut writer, PROTOCOL_NAME)?;
    writer.put_u8(PROTOCOL_LEVEL)?;
    writer.put_u8(CLEAN_SESSION)?;
    writer.put_u16(keep_alive_secs)?;
    put_string(&mut writer, client_id.as_bytes())?;
    Ok(writer.len())
}

/// SUBSCRIBE to one topic filter at QoS 0.
pub fn encode_subscribe(out: &mut [u8], packet_id: u16, topic: &str) -> Result<usize, MqttError> {
    let remaining = 2 + 2 + topic.len() + 1;
    let mut writer = Writer::new(out);
    writer.put_u8(SUBSCRIBE)?;
    put_remaining_length(&mut writer, remaining)?;
    writer.put_u16(packet_id)?;
    put_string(&mut writer, topic.as_bytes())?;
    writer.put_u8(0)?;
    Ok(writer.len())
}

pub fn encode_pingreq(out: &mut [u8]) -> Result<usize, MqttError> {
    encode_empty(out, PINGREQ)
}

pub fn encode_disconnect(out: &mut [u8]) -> Result<usize, MqttError> {
    encode_empty(out, DISCONNECT)
}

fn encode_empty(out: &mut [u8], header: u8) -> Result<usize, MqttError> {
    let mut writer = Writer::new(out);
    writer.put(&[header, 0])?;
    Ok(writer.len())
}

/// Decodes one packet from the front of `buf`.
///
/// Returns the packet and the number of bytes it occupied, or `None` while
/// the packet is still incomplete.
pub fn decode(buf: &[u8]) -> Result<Option<(Packet<'_>, usize)>, MqttError> {
    let Some(&header) = buf.first() else {
        return Ok(None);
    };
    let Some((remaining, len_bytes)) = decode_remaining_length(&buf[1..])? else {
        return Ok(None);
    };

    let body_start = 1 + len_bytes;
    let total = body_start + remaining;
    let Some(body) = buf.get(body_start..total) else {
        return Ok(None);
    };

    let packet = match header & 0xF0 {
        CONNACK => match body {
            [flags, code] => Packet::ConnAck {
                session_present: flags & 0x01 != 0,
                return_code: *code,
            },
            _ => return Err(MqttError::Malformed),
        },
        SUBACK => match body {
            [hi, lo, granted, ..] => {
                if *granted == 0x80 {
                    return Err(MqttError::SubscribeRejected);
                }
                Packet::SubAck {
                    packet_id: u16::from_be_bytes([*hi, *lo]),
                    granted_qos: *granted,
                }
            }
            _ => return Err(MqttError::Malformed),
        },
        PUBLISH => decode_publish(header, body)?,
        PINGRESP => Packet::PingResp,
        _ => Packet::Other(header),
    };

    Ok(Some((packet, total)))
}

fn decode_publish(header: u8, body: &[u8]) -> Result<Packet<'_>, MqttError> {
    let qos = (header >> 1) & 0x03;
    let [hi, lo, rest @ ..] = body else {
        return Err(MqttError::Malformed);
    };
    let topic_len = usize::from(u16::from_be_bytes([*hi, *lo]));
    let topic = rest.get(..topic_len).ok_or(MqttError::Malformed)?;
    let topic = core::str::from_utf8(topic).map_err(|_| MqttError::Malformed)?;

    let payload_start = if qos > 0 { topic_len + 2 } else { topic_len };
    let payload = rest.get(payload_start..).ok_or(MqttError::Malformed)?;
    Ok(Packet::Publish { topic, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_packet_layout() {
        let mut buf = [0u8; 64];
        let len = encode_connect(&mut buf, "homedash-01", 60).unwrap();
        assert_eq!(
            &buf[..len],
            b"\x10\x17\x00\x04MQTT\x04\x02\x00\x3c\x00\x0bhomedash-01"
        );
    }

    #[test]
    fn subscribe_packet_layout() {
        let mut buf = [0u8; 32];
        let len = encode_subscribe(&mut buf, 1, "energy/summary").unwrap();
        assert_eq!(&buf[..len], b"\x82\x13\x00\x01\x00\x0eenergy/summary\x00");
    }

    #[test]
    fn encoders_report_small_buffers() {
        let mut buf = [0u8; 8];
        assert_eq!(
            encode_connect(&mut buf, "homedash-01", 60),
            Err(MqttError::BufferTooSmall)
        );
        assert_eq!(encode_pingreq(&mut buf[..1]), Err(MqttError::BufferTooSmall));
        assert_eq!(encode_disconnect(&mut buf), Ok(2));
        assert_eq!(&buf[..2], [0xE0, 0x00]);
    }

    #[test]
    fn remaining_length_multi_byte() {
        assert_eq!(decode_remaining_length(&[0x00]), Ok(Some((0, 1))));
        assert_eq!(decode_remaining_length(&[0xC1, 0x02]), Ok(Some((321, 2))));
        assert_eq!(decode_remaining_length(&[0xFF, 0xFF]), Ok(None));
        assert_eq!(
            decode_remaining_length(&[0xFF, 0xFF, 0xFF, 0xFF, 0x01]),
            Err(MqttError::BadRemainingLength)
        );

        let mut buf = [0u8; 4];
        let mut writer = Writer::new(&mut buf);
        put_remaining_length(&mut writer, 321).unwrap();
        assert_eq!(writer.len(), 2);
        assert_eq!(&buf[..2], [0xC1, 0x02]);
    }

    #[test]
    fn connack_and_suback() {
        let (packet, used) = decode(&[0x20, 0x02, 0x00, 0x00]).unwrap().unwrap();
        assert_eq!(used, 4);
        assert_eq!(packet.connack_result(), Ok(()));

        let (refused, _) = decode(&[0x20, 0x02, 0x00, 0x05]).unwrap().unwrap();
        assert_eq!(refused.connack_result(), Err(MqttError::Refused(5)));

        assert_eq!(
            decode(&[0x90, 0x03, 0x00, 0x01, 0x00]),
            Ok(Some((Packet::SubAck { packet_id: 1, granted_qos: 0 }, 5)))
        );
        assert_eq!(
            decode(&[0x90, 0x03, 0x00, 0x01, 0x80]),
            Err(MqttError::SubscribeRejected)
        );
    }

    #[test]
    fn publish_is_decoded_incrementally() {
        let wire = b"\x30\x13\x00\x03a/b12:00:00;;61.5\xd0\x00";
        assert_eq!(decode(&wire[..10]), Ok(None));

        let (packet, used) = decode(wire).unwrap().unwrap();
        assert_eq!(
            packet,
            Packet::Publish {
                topic: "a/b",
                payload: b"12:00:00;;61.5",
            }
        );
        assert_eq!(decode(&wire[used..]), Ok(Some((Packet::PingResp, 2))));
    }

    #[test]
    fn qos1_publish_skips_packet_id() {
        let wire = b"\x32\x08\x00\x01t\x00\x07abc";
        let (packet, _) = decode(wire).unwrap().unwrap();
        assert_eq!(packet, Packet::Publish { topic: "t", payload: b"abc" });
    }
}
