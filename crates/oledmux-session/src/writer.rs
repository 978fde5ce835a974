use std::sync::Arc;
use std::time::Duration;

use oledmux_hid::HidTransport;
use oledmux_report::{encode_command, CommandId, ScreenId, MAX_PAYLOAD};
use tracing::{debug, trace, warn};

use crate::producer::Area;

/// Longest row text that fits a `SetLine` report (one byte goes to the row
/// index).
const MAX_LINE_BYTES: usize = MAX_PAYLOAD - 1;

/// The narrow write capability handed to screens.
///
/// Encodes and sends commands over the shared transport. Write failures are
/// logged and absorbed — the command is presumed not applied, nothing else
/// degrades. Screens never see the transport itself.
#[derive(Clone)]
pub struct CommandWriter {
    transport: Arc<dyn HidTransport>,
    area: Area,
    row_pace: Duration,
}

impl CommandWriter {
    pub fn new(transport: Arc<dyn HidTransport>, area: Area, row_pace: Duration) -> Self {
        Self {
            transport,
            area,
            row_pace,
        }
    }

    /// The geometry discovered during the handshake.
    pub fn area(&self) -> Area {
        self.area
    }

    /// Encode and send one command. Returns whether the report went out.
    pub fn send_command(&self, command: CommandId, screen: ScreenId, payload: &[u8]) -> bool {
        let report = encode_command(command, screen, payload);
        match self.transport.write_report(&report) {
            Ok(()) => {
                trace!(?command, %screen, report = ?&report[..], "report sent");
                true
            }
            Err(err) => {
                warn!(?command, %screen, error = %err, "failed to write to device");
                false
            }
        }
    }

    /// Blank a screen.
    pub fn clear(&self, screen: ScreenId) -> bool {
        self.send_command(CommandId::Clear, screen, &[])
    }

    /// Draw a full frame: one `SetLine` per row, then `Present`.
    ///
    /// Consecutive row writes are paced apart — the firmware cannot
    /// reliably absorb back-to-back reports.
    pub async fn draw_frame(&self, screen: ScreenId, lines: &[String]) {
        for (row, line) in lines.iter().enumerate() {
            if row >= usize::from(self.area.height) {
                warn!(
                    %screen,
                    rows = lines.len(),
                    max = self.area.height,
                    "frame has more rows than the screen"
                );
                break;
            }
            if line.len() > usize::from(self.area.width) {
                debug!(
                    %screen,
                    row,
                    len = line.len(),
                    max = self.area.width,
                    "line exceeds screen width"
                );
            }

            let text = &line.as_bytes()[..line.len().min(MAX_LINE_BYTES)];
            let mut payload = Vec::with_capacity(1 + text.len());
            payload.push(row as u8);
            payload.extend_from_slice(text);

            self.send_command(CommandId::SetLine, screen, &payload);
            tokio::time::sleep(self.row_pace).await;
        }

        self.send_command(CommandId::Present, screen, &[]);
    }

    /// Overwrite a span of characters starting at `start` (zero-indexed).
    pub fn draw_chars(&self, screen: ScreenId, start: u8, chars: &str) -> bool {
        let text = &chars.as_bytes()[..chars.len().min(MAX_PAYLOAD - 2)];
        let mut payload = Vec::with_capacity(2 + text.len());
        payload.push(start);
        payload.push(text.len() as u8);
        payload.extend_from_slice(text);
        self.send_command(CommandId::SetChars, screen, &payload)
    }
}

impl std::fmt::Debug for CommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWriter")
            .field("area", &self.area)
            .field("row_pace", &self.row_pace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use oledmux_hid::TransportError;
    use oledmux_report::{Report, COMMAND_MSG, REPORT_SIZE};

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        writes: Mutex<Vec<Report>>,
    }

    impl HidTransport for RecordingTransport {
        fn write_report(&self, report: &Report) -> Result<(), TransportError> {
            self.writes.lock().unwrap().push(*report);
            Ok(())
        }

        fn read_report(&self, _timeout: Duration) -> Result<Option<Report>, TransportError> {
            Ok(None)
        }
    }

    fn writer_over(transport: &Arc<RecordingTransport>) -> CommandWriter {
        CommandWriter::new(
            Arc::clone(transport) as Arc<dyn HidTransport>,
            Area {
                width: 21,
                height: 4,
            },
            Duration::ZERO,
        )
    }

    fn expected_report(command: CommandId, screen: ScreenId, payload: &[u8]) -> Report {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = COMMAND_MSG;
        report[1] = command as u8;
        report[2] = screen as u8;
        report[3..3 + payload.len()].copy_from_slice(payload);
        report
    }

    #[test]
    fn clear_setline_present_frame_exactly() {
        let transport = Arc::new(RecordingTransport::default());
        let writer = writer_over(&transport);

        assert!(writer.clear(ScreenId::Primary));
        assert!(writer.send_command(CommandId::SetLine, ScreenId::Primary, &[0, b'h', b'i']));
        assert!(writer.send_command(CommandId::Present, ScreenId::Primary, &[]));

        let writes = transport.writes.lock().unwrap();
        assert_eq!(writes.len(), 3);
        assert_eq!(
            writes[0],
            expected_report(CommandId::Clear, ScreenId::Primary, &[])
        );
        assert_eq!(
            writes[1],
            expected_report(CommandId::SetLine, ScreenId::Primary, &[0, b'h', b'i'])
        );
        assert_eq!(
            writes[2],
            expected_report(CommandId::Present, ScreenId::Primary, &[])
        );
    }

    #[tokio::test]
    async fn draw_frame_emits_rows_then_present() {
        let transport = Arc::new(RecordingTransport::default());
        let writer = writer_over(&transport);

        let lines = vec!["one".to_string(), "two".to_string()];
        writer.draw_frame(ScreenId::Secondary, &lines).await;

        let writes = transport.writes.lock().unwrap();
        assert_eq!(writes.len(), 3);
        assert_eq!(
            writes[0],
            expected_report(CommandId::SetLine, ScreenId::Secondary, &[0, b'o', b'n', b'e'])
        );
        assert_eq!(
            writes[1],
            expected_report(CommandId::SetLine, ScreenId::Secondary, &[1, b't', b'w', b'o'])
        );
        assert_eq!(
            writes[2],
            expected_report(CommandId::Present, ScreenId::Secondary, &[])
        );
    }

    #[tokio::test]
    async fn draw_frame_clamps_rows_to_screen_height() {
        let transport = Arc::new(RecordingTransport::default());
        let writer = writer_over(&transport);

        let lines: Vec<String> = (0..6).map(|n| format!("row{n}")).collect();
        writer.draw_frame(ScreenId::Primary, &lines).await;

        let writes = transport.writes.lock().unwrap();
        // Four rows fit, then Present.
        assert_eq!(writes.len(), 5);
        assert_eq!(writes[4][1], CommandId::Present as u8);
    }

    #[tokio::test]
    async fn draw_frame_truncates_long_lines() {
        let transport = Arc::new(RecordingTransport::default());
        let writer = writer_over(&transport);

        let long = "x".repeat(60);
        writer.draw_frame(ScreenId::Primary, &[long]).await;

        let writes = transport.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        // Row byte plus at most MAX_LINE_BYTES characters.
        assert_eq!(writes[0][3], 0);
        assert!(writes[0][4..].iter().all(|&b| b == b'x'));
    }

    #[test]
    fn draw_chars_frames_span() {
        let transport = Arc::new(RecordingTransport::default());
        let writer = writer_over(&transport);

        assert!(writer.draw_chars(ScreenId::Primary, 3, "ok"));

        let writes = transport.writes.lock().unwrap();
        assert_eq!(
            writes[0],
            expected_report(CommandId::SetChars, ScreenId::Primary, &[3, 2, b'o', b'k'])
        );
    }
}
