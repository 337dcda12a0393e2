//! MRT dump sinks, SPEC_FULL §6.2. The sink and its RFC 6396 TABLE_DUMP
//! envelope are the consuming process's responsibility; this engine only
//! tees raw, already-length-framed wire messages to whatever `AsyncWrite`
//! is attached. Authored from the spec directly — no MRT-writing precedent
//! exists anywhere in the pack.

use std::collections::BTreeMap;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// One attached dump sink, keyed by the id the parent bridge assigned it
/// (`bridge::parent::MrtOpen`/`MrtSinkId`).
pub struct MrtSink {
    pub id: u32,
    writer: Pin<Box<dyn AsyncWrite + Send>>,
}

impl MrtSink {
    pub fn new(id: u32, writer: Pin<Box<dyn AsyncWrite + Send>>) -> Self {
        MrtSink { id, writer }
    }

    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await
    }
}

/// The set of currently attached sinks. `Engine::tick` holds one of these
/// and feeds it every raw wire message observed on any peer connection,
/// per spec step 9 ("write MRT sinks").
#[derive(Default)]
pub struct MrtTee {
    sinks: BTreeMap<u32, MrtSink>,
}

impl MrtTee {
    pub fn new() -> Self {
        MrtTee::default()
    }

    pub fn attach(&mut self, sink: MrtSink) {
        self.sinks.insert(sink.id, sink);
    }

    pub fn detach(&mut self, id: u32) {
        self.sinks.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Tees `bytes` (one complete, already-encoded wire message, header
    /// included) to every attached sink. A sink whose write fails is
    /// dropped rather than stalling the others — a blocked MRT consumer
    /// must never back-pressure peer sessions.
    pub async fn tee(&mut self, bytes: &[u8]) {
        let mut dead = Vec::new();
        for (id, sink) in self.sinks.iter_mut() {
            if sink.write(bytes).await.is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            self.sinks.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tee_writes_to_attached_sink() {
        let mut tee = MrtTee::new();
        let buf: Vec<u8> = Vec::new();
        let sink = MrtSink::new(1, Box::pin(buf));
        tee.attach(sink);
        tee.tee(&[1, 2, 3]).await;
        assert!(!tee.is_empty());
    }

    #[test]
    fn detach_removes_sink() {
        let mut tee = MrtTee::new();
        tee.attach(MrtSink::new(1, Box::pin(Vec::<u8>::new())));
        tee.detach(1);
        assert!(tee.is_empty());
    }
}
