use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Index of a tag in the registry. Firmware events carry these directly
/// (a `ChangeTag` for tag 3 means the user pressed the "3" key).
pub type TagIndex = u8;

/// Screen geometry in character cells.
///
/// Captured once during the handshake and handed to each producer at start;
/// never changes for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub width: u8,
    pub height: u8,
}

/// One full set of display lines for a screen.
///
/// At most `Area.height` lines of at most `Area.width` printable cells
/// each; the session never inspects their meaning.
pub type TagFrame = Vec<String>;

/// Buffered frames per producer stream.
pub const FRAME_CHANNEL_CAPACITY: usize = 5;

/// A content producer for one tag.
///
/// `start` spawns the producer's own task and returns its frame stream.
/// The producer must observe `cancel` at least once per polling cycle and
/// close the stream (drop the sender) promptly when cancelled — within one
/// polling interval — or whenever it has nothing further to show. Closing
/// the stream is the only completion signal the screen state machine
/// relies on, so a producer that can no longer produce simply terminates.
pub trait TagSource: Send + Sync {
    fn start(&self, area: Area, cancel: CancellationToken) -> mpsc::Receiver<TagFrame>;
}
