use core::convert::Infallible;

use embassy_net::{Stack, tcp::TcpSocket};
use embassy_time::{Duration, Instant, WithTimeout};
use heapless::Vec;
use homedash_core::{
    connectivity::{ClientId, Inbound, MAX_PAYLOAD_BYTES, PayloadKind, SessionStatus},
    protocol::{
        mqtt::{self, MqttError, Packet},
        url::Endpoint,
    },
};
use log::{debug, info, warn};

use super::{SessionError, SessionHandle, resolve, write_all};

const KEEP_ALIVE_SECS: u16 = 60;
const PING_AFTER_SECS: u64 = KEEP_ALIVE_SECS as u64 / 2;
const HANDSHAKE_TIMEOUT_SECS: u64 = 10;
const SUBSCRIBE_PACKET_ID: u16 = 1;

const SOCKET_BYTES: usize = 1024;
const RX_BYTES: usize = MAX_PAYLOAD_BYTES + 256;
const TX_BYTES: usize = 256;

/// Broker session settings.
#[derive(Clone, Copy, Debug)]
pub struct MqttTarget {
    pub endpoint: Endpoint<'static>,
    pub topic: &'static str,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    AwaitConnAck,
    AwaitSubAck,
    Subscribed,
}

/// Runs one broker session per supervisor request: connect, subscribe,
/// then forward every publication until the session breaks.
///
/// Requests that arrive while a session is being set up or is up are only
/// picked up once that session has ended.
pub async fn mqtt_worker(
    stack: Stack<'_>,
    session: &'static SessionHandle,
    target: MqttTarget,
) -> ! {
    let mut socket_rx = [0u8; SOCKET_BYTES];
    let mut socket_tx = [0u8; SOCKET_BYTES];
    let mut rx = [0u8; RX_BYTES];
    let mut tx = [0u8; TX_BYTES];

    loop {
        let client_id = session.begin.wait().await;
        session.set_status(SessionStatus::Connecting);

        let mut socket = TcpSocket::new(stack, &mut socket_rx, &mut socket_tx);
        socket.set_timeout(Some(Duration::from_secs(u64::from(KEEP_ALIVE_SECS) * 2)));

        let result = run_session(
            stack,
            &mut socket,
            session,
            &target,
            &client_id,
            &mut rx,
            &mut tx,
        )
        .await;
        let Err(err) = result;
        warn!("mqtt: session with {} ended: {}", target.endpoint.host, err);

        if let Ok(len) = mqtt::encode_disconnect(&mut tx) {
            let _ = socket.write(&tx[..len]).await;
        }
        socket.abort();
        let _ = socket.flush().await;

        session.set_status(SessionStatus::Failed);
    }
}

async fn run_session(
    stack: Stack<'_>,
    socket: &mut TcpSocket<'_>,
    session: &SessionHandle,
    target: &MqttTarget,
    client_id: &ClientId,
    rx: &mut [u8],
    tx: &mut [u8],
) -> Result<Infallible, SessionError> {
    let address = resolve(stack, target.endpoint.host).await?;
    socket
        .connect((address, target.endpoint.port))
        .await
        .map_err(SessionError::Connect)?;
    info!("mqtt: tcp connected to {}:{}", target.endpoint.host, target.endpoint.port);

    let len = mqtt::encode_connect(tx, client_id, KEEP_ALIVE_SECS)?;
    write_all(socket, &tx[..len]).await?;
    let mut last_sent = Instant::now();

    let mut stage = Stage::AwaitConnAck;
    let mut ping_outstanding = false;
    let mut filled = 0usize;

    loop {
        while let Some((packet, used)) = mqtt::decode(&rx[..filled])? {
            match packet {
                Packet::ConnAck { .. } if stage == Stage::AwaitConnAck => {
                    packet.connack_result()?;
                    let len = mqtt::encode_subscribe(tx, SUBSCRIBE_PACKET_ID, target.topic)?;
                    write_all(socket, &tx[..len]).await?;
                    last_sent = Instant::now();
                    stage = Stage::AwaitSubAck;
                }
                Packet::SubAck { packet_id, granted_qos } if stage == Stage::AwaitSubAck => {
                    if packet_id != SUBSCRIBE_PACKET_ID {
                        return Err(MqttError::Malformed.into());
                    }
                    info!("mqtt: subscribed to {} (qos {})", target.topic, granted_qos);
                    stage = Stage::Subscribed;
                    session.set_status(SessionStatus::Up);
                }
                Packet::Publish { topic, payload } => {
                    debug!("mqtt: {} bytes on {}", payload.len(), topic);
                    session.deliver(frame_payload(payload));
                }
                Packet::PingResp => ping_outstanding = false,
                other => debug!("mqtt: ignoring {:?}", other),
            }

            rx.copy_within(used..filled, 0);
            filled -= used;
        }

        if filled == rx.len() {
            return Err(MqttError::BufferTooSmall.into());
        }

        let wait = match stage {
            Stage::Subscribed => Duration::from_secs(PING_AFTER_SECS)
                .checked_sub(last_sent.elapsed())
                .unwrap_or(Duration::from_ticks(0)),
            _ => Duration::from_secs(HANDSHAKE_TIMEOUT_SECS),
        };

        match socket.read(&mut rx[filled..]).with_timeout(wait).await {
            Ok(Ok(0)) => return Err(SessionError::Closed),
            Ok(Ok(n)) => filled += n,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) if stage != Stage::Subscribed || ping_outstanding => {
                return Err(SessionError::Timeout);
            }
            Err(_) => {
                let len = mqtt::encode_pingreq(tx)?;
                write_all(socket, &tx[..len]).await?;
                last_sent = Instant::now();
                ping_outstanding = true;
            }
        }
    }
}

fn frame_payload(payload: &[u8]) -> Inbound {
    let take = payload.len().min(MAX_PAYLOAD_BYTES);
    if take < payload.len() {
        warn!("mqtt: payload of {} bytes truncated", payload.len());
    }

    let mut bytes = Vec::new();
    let _ = bytes.extend_from_slice(&payload[..take]);
    Inbound {
        kind: PayloadKind::Frame,
        bytes,
    }
}
