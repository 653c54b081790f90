use shared::protocol::EditorEvent;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_CAPACITY: usize = 256;

/// Fan-out of [`EditorEvent`]s between presenters and the surrounding editor.
#[derive(Clone)]
pub struct EventBus {
    events: broadcast::Sender<EditorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { events }
    }

    /// Nobody listening is not an error.
    pub fn publish(&self, event: EditorEvent) {
        trace!(?event, "events: publish");
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }
}
