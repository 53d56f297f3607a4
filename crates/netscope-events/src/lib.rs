use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use netscope_core::{LayoutDirection, NodeId};
use serde::{Deserialize, Serialize};

pub mod telemetry;

/// Notifications published by the viewer after each command settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    GraphLoaded {
        node_count: usize,
        edge_count: usize,
        direction: LayoutDirection,
    },
    /// The previous graph stays on screen.
    LoadFailed {
        error: String,
    },
    /// Loaded fine but there is nothing to draw.
    GraphEmpty,
    LayoutChanged {
        direction: LayoutDirection,
        rank_count: usize,
    },
    EdgeLabelsToggled {
        visible: bool,
    },
    ViewportChanged {
        zoom: f32,
        pan_x: f32,
        pan_y: f32,
    },
    NodeSelected {
        id: NodeId,
    },
    SelectionCleared,
}

/// Bounded event queue. Hosts drain it through [`EventBus::drain`],
/// [`EventBus::dispatch_to`] or [`EventBus::receiver`]; once it is full the
/// oldest pending event is dropped to make room.
#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    /// Never blocks.
    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "publish");
        let mut event = event;
        loop {
            match self.tx.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(dropped) = self.rx.try_recv() {
                        tracing::debug!(?dropped, "event queue full, dropping oldest");
                    }
                    event = rejected;
                }
            }
        }
    }

    /// Drain pending events without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender
            .send(Event::NodeSelected {
                id: NodeId::from("conv1"),
            })
            .unwrap();

        match receiver.recv().unwrap() {
            Event::NodeSelected { id } => assert_eq!(id.as_str(), "conv1"),
            other => panic!("Expected NodeSelected, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_preserves_order() {
        struct Recorder(Vec<Event>);
        impl EventListener for Recorder {
            fn handle_event(&mut self, event: &Event) {
                self.0.push(event.clone());
            }
        }

        let bus = EventBus::new();
        bus.publish(Event::GraphLoaded {
            node_count: 3,
            edge_count: 2,
            direction: LayoutDirection::TopToBottom,
        });
        bus.publish(Event::LayoutChanged {
            direction: LayoutDirection::LeftToRight,
            rank_count: 3,
        });

        let mut recorder = Recorder(Vec::new());
        bus.dispatch_to(&mut recorder);

        assert_eq!(recorder.0.len(), 2);
        assert!(matches!(recorder.0[0], Event::GraphLoaded { node_count: 3, .. }));
        assert!(matches!(
            recorder.0[1],
            Event::LayoutChanged {
                direction: LayoutDirection::LeftToRight,
                ..
            }
        ));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_undrained_bus_keeps_newest() {
        let bus = EventBus::with_capacity(2);
        for visible in [true, false, true] {
            bus.publish(Event::EdgeLabelsToggled { visible });
        }
        bus.publish(Event::SelectionCleared);

        assert_eq!(
            bus.drain(),
            vec![
                Event::EdgeLabelsToggled { visible: true },
                Event::SelectionCleared
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&Event::LoadFailed {
            error: "boom".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"LoadFailed":{"error":"boom"}}"#);
    }
}
