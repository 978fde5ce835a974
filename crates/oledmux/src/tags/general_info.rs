use std::time::Duration;

use oledmux_session::{Area, TagFrame, TagSource, FRAME_CHANNEL_CAPACITY};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// General information view.
///
/// Line one is the local time, line two the active keymap layer (the
/// firmware substitutes `%l`), line three a friendly message, line four is
/// left blank.
pub struct GeneralInfo {
    tick: Duration,
}

impl GeneralInfo {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    fn frame() -> TagFrame {
        vec![
            chrono::Local::now().format("%a %b %e %H:%M:%S").to_string(),
            "Layer: %l".to_string(),
            "You look great today!".to_string(),
            String::new(),
        ]
    }
}

impl TagSource for GeneralInfo {
    fn start(&self, _area: Area, cancel: CancellationToken) -> mpsc::Receiver<TagFrame> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let tick = self.tick;

        tokio::spawn(async move {
            loop {
                if tx.send(Self::frame()).await.is_err() {
                    return;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(tick) => {}
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_four_lines() {
        let frame = GeneralInfo::frame();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[1], "Layer: %l");
        assert!(frame[3].is_empty());
    }

    #[tokio::test]
    async fn produces_until_cancelled() {
        let info = GeneralInfo::new(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let mut frames = info.start(
            Area {
                width: 21,
                height: 4,
            },
            cancel.clone(),
        );

        assert!(frames.recv().await.is_some());
        assert!(frames.recv().await.is_some());

        cancel.cancel();
        // The stream closes within one polling cycle.
        loop {
            match frames.recv().await {
                Some(_) => continue,
                None => break,
            }
        }
    }
}
