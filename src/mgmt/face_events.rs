//! Bounded log of face lifecycle events.
//!
//! Each event gets the next identifier from a counter that never goes
//! backwards; once the log is full the oldest event is forgotten.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use bytes::Bytes;

use crate::{
    ndn::{Component, Data, Name},
    tlv::{TlvWriter, types},
};

/// FreshnessPeriod of face event Data.
pub const FACE_EVENT_FRESHNESS: Duration = Duration::from_millis(1);

/// What happened to a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceEventKind {
    /// The face was created.
    Created,
    /// The face was destroyed.
    Destroyed,
    /// The face came up.
    Up,
    /// The face went down.
    Down,
}

impl FaceEventKind {
    /// `FaceEventKind` code on the wire.
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            Self::Created => 1,
            Self::Destroyed => 2,
            Self::Up => 3,
            Self::Down => 4,
        }
    }
}

/// One recorded face event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceEvent {
    /// Position in the event stream.
    pub id: u64,
    /// Event type.
    pub kind: FaceEventKind,
    /// Affected face.
    pub face_id: u64,
    /// Remote URI of the face, if known.
    pub uri: String,
    /// Local URI of the face, if known.
    pub local_uri: String,
}

impl FaceEvent {
    /// Encode as a `FaceEventNotification` element.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut writer = TlvWriter::new();
        writer.put_nested(types::FACE_EVENT_NOTIFICATION, |event| {
            event
                .put_nni(types::FACE_EVENT_KIND, self.kind.code())
                .put_nni(types::FACE_ID, self.face_id)
                .put(types::URI, self.uri.as_bytes())
                .put(types::LOCAL_URI, self.local_uri.as_bytes());
        });
        writer.into_bytes()
    }

    /// The Data announcing this event: `<prefix>/faces/events/seq=<id>`.
    #[must_use]
    pub fn to_data(&self, prefix: &Name) -> Data {
        let name = prefix
            .append(Component::generic(&b"faces"[..]))
            .append(Component::generic(&b"events"[..]))
            .append(Component::sequence_num(self.id));
        Data::new(name, self.encode()).with_freshness_period(FACE_EVENT_FRESHNESS)
    }
}

#[derive(Debug)]
struct LogState {
    next_id: u64,
    events: VecDeque<FaceEvent>,
}

/// Thread-safe bounded face event log.
#[derive(Debug)]
pub struct FaceEventLog {
    capacity: NonZeroUsize,
    state: Mutex<LogState>,
}

impl FaceEventLog {
    /// Create a log keeping at most `capacity` events.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            state: Mutex::new(LogState {
                next_id: 1,
                events: VecDeque::with_capacity(capacity.get()),
            }),
        }
    }

    /// Record an event and return it with its assigned id.
    pub fn record(
        &self,
        kind: FaceEventKind,
        face_id: u64,
        uri: String,
        local_uri: String,
    ) -> FaceEvent {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let event = FaceEvent {
            id: state.next_id,
            kind,
            face_id,
            uri,
            local_uri,
        };
        state.next_id += 1;
        if state.events.len() == self.capacity.get() {
            state.events.pop_front();
        }
        state.events.push_back(event.clone());
        event
    }

    /// Look up a retained event.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<FaceEvent> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let oldest = state.events.front()?.id;
        let offset = usize::try_from(id.checked_sub(oldest)?).ok()?;
        state.events.get(offset).cloned()
    }

    /// The most recent event, if any.
    #[must_use]
    pub fn last(&self) -> Option<FaceEvent> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.events.back().cloned()
    }
}
