use crate::domain::events::{ConnectionState, Event};
use crate::ws::dispatcher::{CommandDispatcher, Link, Outgoing};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, Sender};
use tokio::sync::watch;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::connect_async;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
pub struct Config {
    pub url: String,
    pub retry_ms: u64,
    pub retry_max_delay: Duration,
    pub stale_connection_timeout: Duration,
    pub buffer_size: usize,
}

/// How a session on an open socket ended.
#[derive(Debug)]
enum Session {
    /// Closed through [`CommandDispatcher::close`].
    Closed,
    Lost(ConnectionError),
}

/// Delays between connection attempts: `retry_ms`, then doubling up to `max_delay`.
fn backoff(retry_ms: u64, max_delay: Duration) -> ExponentialBackoff {
    // Each delay is `factor * 2^n` milliseconds
    ExponentialBackoff::from_millis(2).factor((retry_ms / 2).max(1)).max_delay(max_delay)
}

/// Keeps a connection to the device open until [`CommandDispatcher::close`] is called,
/// reconnecting with exponential backoff whenever it drops.
#[instrument(skip_all, fields(url = %config.url))]
pub async fn connect(link: watch::Sender<Link>, dispatcher: CommandDispatcher, events_tx: Sender<Event>, config: &Config) -> Result<(), ConnectionError> {
    loop {
        info!("Connecting to device {}...", config.url);

        // The backoff restarts with every session
        let session = RetryIf::start(
            backoff(config.retry_ms, config.retry_max_delay).map(jitter),
            || async {
                connect_socket(&link, &dispatcher, &events_tx, config)
                    .await
                    .inspect_err(|e| warn!("⚠️ Could not connect to device: {}. Retrying...", e))
            },
            |e: &ConnectionError| !matches!(e, ConnectionError::StoreClosed),
        )
        .await?;

        match session {
            Session::Closed => {
                info!("✅ Device connection closed");
                return Ok(());
            }
            Session::Lost(e) => {
                warn!("⚠️ Device connection lost: {}. Reconnecting in {}ms...", e, config.retry_ms);
                sleep(Duration::from_millis(config.retry_ms)).await;
            }
        }
    }
}

async fn connect_socket(link: &watch::Sender<Link>, dispatcher: &CommandDispatcher, events_tx: &Sender<Event>, config: &Config) -> Result<Session, ConnectionError> {
    publish(events_tx, ConnectionState::Connecting).await?;

    let socket = match connect_async(config.url.as_str()).await {
        Ok((socket, response)) => {
            info!(status = %response.status(), "Connecting to device {}... OK", config.url);
            socket
        }
        Err(e) => {
            publish(events_tx, ConnectionState::Errored).await?;
            return Err(e.into());
        }
    };

    let (outgoing_tx, outgoing_rx) = mpsc::channel::<Outgoing>(config.buffer_size);
    let open_link = OpenLink::new(link, outgoing_tx);
    publish(events_tx, ConnectionState::Open).await?;

    // Re-synchronize the whole dashboard on every (re)connect
    dispatcher.read_all().await;

    let result = pump(socket, outgoing_rx, events_tx, config.stale_connection_timeout).await;
    drop(open_link);

    let (state, session) = match result {
        Ok(()) => (ConnectionState::Closed, Session::Closed),
        Err(ConnectionError::StoreClosed) => return Err(ConnectionError::StoreClosed),
        Err(ConnectionError::Closed) => (ConnectionState::Closed, Session::Lost(ConnectionError::Closed)),
        Err(e) => (ConnectionState::Errored, Session::Lost(e)),
    };
    publish(events_tx, state).await?;

    Ok(session)
}

/// Moves frames between the socket and the rest of the client until either side gives up.
async fn pump<S>(socket: S, mut outgoing_rx: mpsc::Receiver<Outgoing>, events_tx: &Sender<Event>, stale_timeout: Duration) -> Result<(), ConnectionError>
where
    S: futures::Stream<Item = Result<Message, tungstenite::Error>> + futures::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let (mut sink, mut stream) = socket.split();
    let mut deadline = Instant::now() + stale_timeout;

    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => match outgoing {
                Some(Outgoing::Frame(text)) => sink.send(Message::text(text)).await?,
                Some(Outgoing::Close) | None => {
                    debug!("Closing device connection...");
                    sink.send(Message::Close(None)).await?;
                    return Ok(());
                }
            },
            incoming = stream.next() => {
                deadline = Instant::now() + stale_timeout;
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        debug!(frame = text.as_str(), "📥 Received frame");
                        events_tx
                            .send(Event::FrameReceived(text.as_str().to_string()))
                            .await
                            .map_err(|_| ConnectionError::StoreClosed)?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!("🔴 Device closed the connection: {:?}", frame);
                        return Err(ConnectionError::Closed);
                    }
                    Some(Ok(other)) => debug!("Ignoring non-text frame {:?}", other),
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        warn!("🔴 Device connection ended");
                        return Err(ConnectionError::Closed);
                    }
                }
            }
            _ = sleep_until(deadline) => {
                warn!("⏳ No data for {} seconds. Reconnecting...", stale_timeout.as_secs());
                return Err(ConnectionError::Stale(stale_timeout));
            }
        }
    }
}

async fn publish(events_tx: &Sender<Event>, state: ConnectionState) -> Result<(), ConnectionError> {
    events_tx
        .send(Event::ConnectionChanged(state))
        .await
        .map_err(|_| ConnectionError::StoreClosed)
}

/// Publishes the outgoing channel to the dispatchers for as long as the socket is open.
struct OpenLink<'a> {
    link: &'a watch::Sender<Link>,
}

impl<'a> OpenLink<'a> {
    fn new(link: &'a watch::Sender<Link>, outgoing_tx: Sender<Outgoing>) -> Self {
        link.send_replace(Some(outgoing_tx));
        OpenLink { link }
    }
}

impl Drop for OpenLink<'_> {
    fn drop(&mut self) {
        self.link.send_replace(None);
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("connection closed by the device")]
    Closed,
    #[error("no data received for {0:?}")]
    Stale(Duration),
    #[error("the store stopped listening")]
    StoreClosed,
}
