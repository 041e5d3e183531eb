use embassy_futures::select::{Either, select};
use embassy_net::{IpAddress, Stack, tcp::TcpSocket};
use embassy_time::Duration;
use homedash_core::{
    connectivity::{Inbound, MAX_PAYLOAD_BYTES, PayloadKind, SessionStatus},
    protocol::{
        http::{self, BodyWindow, HttpError},
        url::HttpUrl,
    },
};
use log::{info, warn};

use super::{SessionError, SessionHandle, resolve, write_all};

const FETCH_TIMEOUT_SECS: u64 = 20;
const SOCKET_BYTES: usize = 1536;
const HEADER_BYTES: usize = 1024;
const TX_BYTES: usize = 256;

/// Status page settings.
#[derive(Clone, Copy, Debug)]
pub struct HttpTarget {
    pub url: HttpUrl<'static>,
    /// Element id the body window is positioned on.
    pub anchor: &'static str,
}

/// Resolves the status page host when the supervisor starts a session,
/// then fetches the page on every refresh request.
///
/// A failed fetch is only logged; the session stays up and the next
/// scheduled poll tries again. A repeated session request re-resolves the
/// host without reporting the session down unless resolution fails.
pub async fn http_worker(
    stack: Stack<'_>,
    session: &'static SessionHandle,
    target: HttpTarget,
) -> ! {
    let mut socket_rx = [0u8; SOCKET_BYTES];
    let mut socket_tx = [0u8; SOCKET_BYTES];
    let mut header = [0u8; HEADER_BYTES];
    let mut tx = [0u8; TX_BYTES];

    session.begin.wait().await;
    loop {
        let address = match resolve(stack, target.url.host).await {
            Ok(address) => address,
            Err(err) => {
                warn!("http: cannot reach {}: {}", target.url.host, err);
                session.set_status(SessionStatus::Failed);
                session.begin.wait().await;
                continue;
            }
        };
        info!("http: {} resolved to {}", target.url.host, address);
        session.set_status(SessionStatus::Up);

        loop {
            match select(session.refresh.wait(), session.begin.wait()).await {
                Either::First(()) => {
                    let mut socket = TcpSocket::new(stack, &mut socket_rx, &mut socket_tx);
                    socket.set_timeout(Some(Duration::from_secs(FETCH_TIMEOUT_SECS)));

                    match fetch(&mut socket, address, &target, &mut header, &mut tx).await {
                        Ok(inbound) => session.deliver(inbound),
                        Err(err) => warn!("http: fetch of {} failed: {}", target.url.path, err),
                    }

                    socket.close();
                    socket.abort();
                }
                Either::Second(_) => break,
            }
        }
    }
}

async fn fetch(
    socket: &mut TcpSocket<'_>,
    address: IpAddress,
    target: &HttpTarget,
    header: &mut [u8],
    tx: &mut [u8],
) -> Result<Inbound, SessionError> {
    socket
        .connect((address, target.url.port))
        .await
        .map_err(SessionError::Connect)?;

    let len = http::encode_get(tx, target.url.host, target.url.path)?;
    write_all(socket, &tx[..len]).await?;

    let mut window = BodyWindow::<MAX_PAYLOAD_BYTES>::new(target.anchor);
    let mut filled = 0usize;
    let mut wants_more = loop {
        if filled == header.len() {
            return Err(HttpError::BufferTooSmall.into());
        }

        let read = socket.read(&mut header[filled..]).await?;
        if read == 0 {
            return Err(SessionError::Closed);
        }
        filled += read;

        if let Some(response) = http::parse_response(&header[..filled])? {
            break window.push(response.into_body()?);
        }
    };

    while wants_more {
        let read = socket.read(header).await?;
        if read == 0 {
            break;
        }
        wants_more = window.push(&header[..read]);
    }

    if !window.is_anchored() {
        warn!("http: id {} not found in page", target.anchor);
    }

    Ok(Inbound {
        kind: PayloadKind::Document,
        bytes: window.into_bytes(),
    })
}
