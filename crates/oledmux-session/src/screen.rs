use std::sync::Arc;

use bytes::Bytes;
use oledmux_report::{EventId, ScreenId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::producer::{TagFrame, TagIndex};
use crate::registry::TagRegistry;
use crate::writer::CommandWriter;

/// A decoded firmware event, routed to the screen it addresses.
#[derive(Debug, Clone)]
pub struct TagEvent {
    pub event: EventId,
    pub screen: ScreenId,
    pub params: Bytes,
}

/// What the screen is currently doing.
///
/// `Showing` owns the live producer: its private cancellation token and its
/// frame stream. Dropping back to `Idle` only happens once the stream has
/// closed, which is what guarantees a successor can never interleave with
/// its predecessor.
enum Activity {
    Idle,
    Showing {
        cancel: CancellationToken,
        frames: mpsc::Receiver<TagFrame>,
    },
}

/// The state machine driving one physical screen.
///
/// Runs as a single task selecting over {inbound event, next producer
/// frame, session cancellation}. Spawned by the device session once the
/// handshake has established geometry.
pub struct ScreenTask {
    id: ScreenId,
    writer: CommandWriter,
    registry: Arc<TagRegistry>,
    events: mpsc::Receiver<TagEvent>,
    cancel: CancellationToken,
    active_tag: TagIndex,
}

impl ScreenTask {
    pub fn new(
        id: ScreenId,
        initial_tag: TagIndex,
        writer: CommandWriter,
        registry: Arc<TagRegistry>,
        events: mpsc::Receiver<TagEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            writer,
            registry,
            events,
            cancel,
            active_tag: initial_tag,
        }
    }

    /// Run until the session cancels.
    pub async fn run(mut self) {
        let mut activity = self.show_tag(self.active_tag);

        loop {
            match activity {
                Activity::Showing { .. } => {
                    tokio::select! {
                        maybe_event = self.events.recv() => {
                            let Some(event) = maybe_event else { break };
                            if let Some(target) = self.resolve_target(&event) {
                                Self::stop_producer(&mut activity).await;
                                if self.cancel.is_cancelled() {
                                    break;
                                }
                                activity = self.show_tag(target);
                            }
                        }
                        maybe_frame = Self::next_frame(&mut activity) => {
                            match maybe_frame {
                                Some(lines) => {
                                    self.writer.draw_frame(self.id, &lines).await;
                                }
                                None => {
                                    // Tag finished on its own: blank and wait
                                    // for the next event. No auto-restart.
                                    debug!(screen = %self.id, tag = self.active_tag, "tag finished");
                                    self.writer.clear(self.id);
                                    activity = Activity::Idle;
                                }
                            }
                        }
                        _ = self.cancel.cancelled() => {
                            Self::stop_producer(&mut activity).await;
                            break;
                        }
                    }
                }
                Activity::Idle => {
                    tokio::select! {
                        maybe_event = self.events.recv() => {
                            let Some(event) = maybe_event else { break };
                            if let Some(target) = self.resolve_target(&event) {
                                activity = self.show_tag(target);
                            }
                        }
                        _ = self.cancel.cancelled() => break,
                    }
                }
            }
        }

        debug!(screen = %self.id, "screen stopped");
    }

    /// Start the producer for `tag`, if it is registered.
    fn show_tag(&mut self, tag: TagIndex) -> Activity {
        match self.registry.get(tag) {
            Some(source) => {
                self.active_tag = tag;
                debug!(screen = %self.id, tag, "showing tag");
                let cancel = CancellationToken::new();
                let frames = source.start(self.writer.area(), cancel.clone());
                Activity::Showing { cancel, frames }
            }
            None => {
                warn!(screen = %self.id, tag, "tag out of range");
                Activity::Idle
            }
        }
    }

    /// Map an inbound event to the tag it asks for.
    ///
    /// Returns `None` when the event must be ignored (unknown tag, empty
    /// registry). An event addressed to a different screen can only mean
    /// the session routed it wrong, which is a bug, not device input.
    fn resolve_target(&self, event: &TagEvent) -> Option<TagIndex> {
        assert_eq!(
            event.screen, self.id,
            "event for screen {} delivered to screen {}",
            event.screen, self.id
        );

        match event.event {
            EventId::ChangeTag => {
                let Some(&target) = event.params.first() else {
                    warn!(screen = %self.id, "change-tag event without a tag index");
                    return None;
                };
                if !self.registry.contains(target) {
                    warn!(screen = %self.id, tag = target, "tag out of range");
                    return None;
                }
                Some(target)
            }
            EventId::IncrementTag => {
                let next = self.registry.next_after(self.active_tag);
                if next.is_none() {
                    warn!(screen = %self.id, "cannot increment tag: no tags registered");
                }
                next
            }
            EventId::DecrementTag => {
                let prev = self.registry.prev_before(self.active_tag);
                if prev.is_none() {
                    warn!(screen = %self.id, "cannot decrement tag: no tags registered");
                }
                prev
            }
        }
    }

    async fn next_frame(activity: &mut Activity) -> Option<TagFrame> {
        match activity {
            Activity::Showing { frames, .. } => frames.recv().await,
            // `run` only selects on frames while showing.
            Activity::Idle => std::future::pending().await,
        }
    }

    /// Cancel the live producer and wait for its stream to close.
    ///
    /// Residual frames are discarded. The caller may only start a successor
    /// once this returns — the stop-before-start handshake that keeps two
    /// producers from ever writing to the same screen.
    async fn stop_producer(activity: &mut Activity) {
        if let Activity::Showing { cancel, frames } = activity {
            cancel.cancel();
            while frames.recv().await.is_some() {}
        }
        *activity = Activity::Idle;
    }
}
