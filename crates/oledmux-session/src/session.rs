use std::sync::Arc;
use std::time::Duration;

use oledmux_hid::HidTransport;
use oledmux_report::{decode_report, encode_command, CommandId, Message, ScreenId};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Result, SessionError};
use crate::producer::{Area, TagIndex};
use crate::registry::TagRegistry;
use crate::screen::{ScreenTask, TagEvent};
use crate::writer::CommandWriter;

/// Buffered events per screen. Firmware events are key presses, so the
/// queue stays tiny; a full queue briefly parks the read loop instead of
/// dropping input.
const EVENT_CHANNEL_CAPACITY: usize = 4;

/// Tuning knobs of one session. Constructed once and passed in; nothing
/// here changes at runtime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on one read attempt in the read loop. Must comfortably
    /// exceed the producers' polling interval.
    pub read_timeout: Duration,
    /// Upper bound on the wait for the set-up response.
    pub handshake_timeout: Duration,
    /// Pacing between consecutive row writes within one frame. A hardware
    /// contract: the firmware drops back-to-back reports.
    pub row_pace: Duration,
    /// Read timeout while draining stale reports at shutdown.
    pub drain_timeout: Duration,
    /// Tag shown on the primary screen at session start.
    pub primary_tag: TagIndex,
    /// Tag shown on the secondary screen at session start.
    pub secondary_tag: TagIndex,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(500),
            handshake_timeout: Duration::from_millis(500),
            row_pace: Duration::from_millis(10),
            drain_timeout: Duration::from_millis(50),
            primary_tag: 1,
            secondary_tag: 2,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// External quit; the caller should not reconnect.
    Quit,
    /// The transport failed mid-session; the caller may reconnect.
    TransportLost,
}

/// One session against one opened device.
///
/// Exclusively owns the transport from handshake to teardown. Screens get
/// a [`CommandWriter`]; the read loop and the drain are the only readers.
pub struct DeviceSession {
    transport: Arc<dyn HidTransport>,
    registry: Arc<TagRegistry>,
    config: SessionConfig,
}

impl DeviceSession {
    pub fn new(
        transport: Arc<dyn HidTransport>,
        registry: Arc<TagRegistry>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    /// Run the session to completion.
    ///
    /// Performs the handshake, spawns one screen task per display plus the
    /// read loop, then waits for either `quit` or a fatal transport error.
    /// Returns how the session ended; handshake failures surface as errors
    /// before any screen has been spawned.
    pub async fn run(self, quit: CancellationToken) -> Result<SessionEnd> {
        let area = self.handshake().await?;
        info!(columns = area.width, rows = area.height, "device ready");

        let cancel = CancellationToken::new();
        let writer = CommandWriter::new(Arc::clone(&self.transport), area, self.config.row_pace);

        let (primary_tx, primary_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (secondary_tx, secondary_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut screens = Vec::with_capacity(2);
        for (id, initial_tag, events) in [
            (ScreenId::Primary, self.config.primary_tag, primary_rx),
            (ScreenId::Secondary, self.config.secondary_tag, secondary_rx),
        ] {
            let screen = ScreenTask::new(
                id,
                initial_tag,
                writer.clone(),
                Arc::clone(&self.registry),
                events,
                cancel.clone(),
            );
            screens.push(task::spawn(screen.run()));
        }

        let reader = {
            let transport = Arc::clone(&self.transport);
            let read_timeout = self.config.read_timeout;
            let cancel = cancel.clone();
            task::spawn_blocking(move || {
                read_loop(transport, read_timeout, cancel, primary_tx, secondary_tx)
            })
        };

        let end = tokio::select! {
            _ = quit.cancelled() => SessionEnd::Quit,
            _ = cancel.cancelled() => SessionEnd::TransportLost,
        };
        info!(?end, "stopping session");

        // One broadcast stops the read loop and every screen.
        cancel.cancel();
        for screen in screens {
            screen.await?;
        }
        reader.await?;

        for screen in ScreenId::ALL {
            writer.clear(screen);
        }
        self.drain().await?;

        Ok(end)
    }

    /// Discover screen geometry.
    ///
    /// Sends `SetUp` to the primary screen and reads exactly one response
    /// within the handshake timeout. Anything but a successful set-up
    /// answer with non-zero dimensions aborts the session before any
    /// screen exists.
    async fn handshake(&self) -> Result<Area> {
        let report = encode_command(CommandId::SetUp, ScreenId::Primary, &[]);
        self.transport.write_report(&report)?;

        let transport = Arc::clone(&self.transport);
        let timeout = self.config.handshake_timeout;
        let outcome = task::spawn_blocking(move || transport.read_report(timeout)).await??;

        let Some(report) = outcome else {
            return Err(SessionError::HandshakeTimeout(timeout));
        };

        match decode_report(&report)? {
            Some(Message::Response {
                success: true,
                command: CommandId::SetUp,
                params,
                ..
            }) => {
                let columns = params.first().copied().unwrap_or(0);
                let rows = params.get(1).copied().unwrap_or(0);
                if columns < 1 || rows < 1 {
                    return Err(SessionError::BadGeometry { columns, rows });
                }
                Ok(Area {
                    width: columns,
                    height: rows,
                })
            }
            Some(Message::Response { success: false, .. }) => Err(SessionError::HandshakeFailed(
                "set-up command failed".to_string(),
            )),
            Some(Message::Response { command, .. }) => Err(SessionError::HandshakeFailed(format!(
                "response answers {command:?}, not set-up"
            ))),
            Some(Message::Event { event, .. }) => Err(SessionError::HandshakeFailed(format!(
                "expected a set-up response, got event {event:?}"
            ))),
            None => Err(SessionError::HandshakeTimeout(timeout)),
        }
    }

    /// Read-and-discard whatever is still in flight.
    ///
    /// Stale reports left in the HID pipe would be misread as the next
    /// session's handshake response.
    async fn drain(&self) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        let timeout = self.config.drain_timeout;
        task::spawn_blocking(move || loop {
            match transport.read_report(timeout) {
                Ok(Some(report)) => trace!(report = ?&report[..], "discarding stale report"),
                Ok(None) | Err(_) => break,
            }
        })
        .await?;
        Ok(())
    }
}

/// The single inbound read loop.
///
/// Runs on a blocking thread for the lifetime of the session; every read
/// carries a bounded timeout so cancellation is observed at least once per
/// `read_timeout`. Decoded events are routed to the owning screen; a
/// transport-level read failure is fatal and cancels the whole session.
fn read_loop(
    transport: Arc<dyn HidTransport>,
    read_timeout: Duration,
    cancel: CancellationToken,
    primary: mpsc::Sender<TagEvent>,
    secondary: mpsc::Sender<TagEvent>,
) {
    while !cancel.is_cancelled() {
        let report = match transport.read_report(read_timeout) {
            Ok(Some(report)) => {
                trace!(report = ?&report[..], "report received");
                report
            }
            Ok(None) => continue,
            Err(err) => {
                // Device is probably unreachable; end the session.
                error!(error = %err, "failed to read from device");
                cancel.cancel();
                return;
            }
        };

        match decode_report(&report) {
            Ok(Some(Message::Event {
                event,
                screen,
                params,
            })) => {
                let routed = TagEvent {
                    event,
                    screen,
                    params,
                };
                let sender = match screen {
                    ScreenId::Primary => &primary,
                    ScreenId::Secondary => &secondary,
                };
                if sender.blocking_send(routed).is_err() {
                    debug!(%screen, "screen is gone, dropping event");
                }
            }
            Ok(Some(Message::Response {
                success: false,
                command,
                screen,
                ..
            })) => {
                warn!(?command, %screen, "command failed");
            }
            Ok(Some(Message::Response { command, .. })) => {
                trace!(?command, "unsolicited response");
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, report = ?&report[..], "dropping undecodable report");
            }
        }
    }
}
