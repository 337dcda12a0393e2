//! Per-connection write loop with HIGH/LOW watermark back-pressure
//! (XOFF/XON) and SendHold bookkeeping, spec §4.4. Grounded on the
//! teacher's `peer_start_writer` in `examples/zebra-rs-bgpd/src/fsm/peer.rs`,
//! which only drained a channel; the watermark/SendHold layer is new.

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::UnboundedReceiver;

/// Above this many queued bytes the writer reports itself throttled
/// (XOFF); the engine stops accepting further outbound traffic for the
/// peer until the queue drains below `LOW_WATERMARK` (XON).
pub const HIGH_WATERMARK: usize = 1 << 20;
pub const LOW_WATERMARK: usize = HIGH_WATERMARK / 4;

/// The writer task itself only knows about one message at a time (the
/// mpsc channel hides how much is backed up behind it), so it cannot judge
/// watermarks on its own. It reports every completed write's size back to
/// the engine, which keeps the authoritative `Peer::write_queue_len` and
/// decides XOFF/XON and SendHold centrally — the same reasoning that put
/// the timer set in one place rather than one task per timer.
#[derive(Debug)]
pub struct Drained {
    pub peer_id: u32,
    pub bytes: usize,
}

pub async fn run(
    peer_id: u32,
    mut write_half: OwnedWriteHalf,
    mut rx: UnboundedReceiver<BytesMut>,
    drained_tx: tokio::sync::mpsc::UnboundedSender<Drained>,
) {
    while let Some(msg) = rx.recv().await {
        let len = msg.len();
        if write_half.write_all(&msg).await.is_err() {
            return;
        }
        if drained_tx.send(Drained { peer_id, bytes: len }).is_err() {
            return;
        }
    }
}

/// Whether enqueuing `added` more bytes onto a peer currently holding
/// `queued_before` crosses into XOFF territory (spec §4.4).
pub fn crosses_high_watermark(queued_before: usize, added: usize) -> bool {
    queued_before < HIGH_WATERMARK && queued_before + added >= HIGH_WATERMARK
}

/// Whether draining down to `queued_after` crosses back below the low
/// watermark, clearing XOFF.
pub fn crosses_low_watermark(queued_before: usize, queued_after: usize) -> bool {
    queued_before >= LOW_WATERMARK && queued_after < LOW_WATERMARK
}
