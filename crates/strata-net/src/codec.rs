use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use thiserror::Error;

use strata_world::CHUNK_VOLUME;

use crate::message::{
    CHUNK_MESSAGE_ID, ChunkSnapshot, Message, SEED_MESSAGE_ID, TIME_MESSAGE_ID, VOXEL_MESSAGE_ID,
};

/// Largest frame accepted off the wire, id included.
pub const MAX_FRAME_LEN: usize = 1 << 20;

// Inflated snapshot payload: ids plus a little bincode framing.
const MAX_SNAPSHOT_LEN: u64 = CHUNK_VOLUME as u64 + 64;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame truncated: {0} bytes")]
    Truncated(usize),
    #[error("frame of {0} bytes exceeds limit")]
    Oversize(usize),
    #[error("unknown message id {0}")]
    UnknownMessage(u16),
    #[error("payload decode failed: {0}")]
    Decode(#[from] bincode::Error),
    #[error("snapshot inflate failed: {0}")]
    Inflate(#[from] io::Error),
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut enc = DeflateEncoder::new(Vec::with_capacity(data.len() / 4), Compression::best());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_SNAPSHOT_LEN + 1)
        .read_to_end(&mut out)?;
    if out.len() as u64 > MAX_SNAPSHOT_LEN {
        return Err(ProtocolError::Oversize(out.len()));
    }
    Ok(out)
}

/// `[id: u16 LE][payload]`. Chunk snapshots are DEFLATE-compressed as a whole.
pub fn encode(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = match msg {
        Message::Seed(m) => bincode::serialize(m)?,
        Message::Voxel(m) => bincode::serialize(m)?,
        Message::Chunk(m) => deflate(&bincode::serialize(m)?)?,
        Message::Time(m) => bincode::serialize(m)?,
    };
    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.extend_from_slice(&msg.id().to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn decode(frame: &[u8]) -> Result<Message, ProtocolError> {
    if frame.len() < 2 {
        return Err(ProtocolError::Truncated(frame.len()));
    }
    if frame.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::Oversize(frame.len()));
    }
    let id = u16::from_le_bytes([frame[0], frame[1]]);
    let payload = &frame[2..];
    Ok(match id {
        SEED_MESSAGE_ID => Message::Seed(bincode::deserialize(payload)?),
        VOXEL_MESSAGE_ID => Message::Voxel(bincode::deserialize(payload)?),
        CHUNK_MESSAGE_ID => {
            let snap: ChunkSnapshot = bincode::deserialize(&inflate(payload)?)?;
            Message::Chunk(snap)
        }
        TIME_MESSAGE_ID => Message::Time(bincode::deserialize(payload)?),
        other => return Err(ProtocolError::UnknownMessage(other)),
    })
}

/// Appends `[len: u32 LE][frame]` to `out`.
pub fn write_frame(out: &mut Vec<u8>, msg: &Message) -> Result<(), ProtocolError> {
    let frame = encode(msg)?;
    out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
    out.extend_from_slice(&frame);
    Ok(())
}

/// Reassembles length-prefixed frames from a byte stream.
#[derive(Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete message, if one is buffered. An oversize length
    /// prefix poisons the stream; the buffer is cleared.
    pub fn next_message(&mut self) -> Option<Result<Message, ProtocolError>> {
        if self.buf.len() < 4 {
            return None;
        }
        let len = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > MAX_FRAME_LEN {
            self.buf.clear();
            return Some(Err(ProtocolError::Oversize(len)));
        }
        if self.buf.len() < 4 + len {
            return None;
        }
        let frame: Vec<u8> = self.buf.drain(..4 + len).skip(4).collect();
        Some(decode(&frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{SeedMsg, TimeMsg};
    use strata_edit::VoxelDelta;
    use strata_geom::IVec3;

    fn snapshot() -> ChunkSnapshot {
        let mut ids = vec![0u8; CHUNK_VOLUME];
        for (i, id) in ids.iter_mut().enumerate().take(16 * 16 * 4) {
            *id = (i % 3) as u8 + 1;
        }
        ChunkSnapshot {
            pos: IVec3::new(-2, 0, 5),
            block_ids: ids,
        }
    }

    #[test]
    fn frames_start_with_message_id() {
        let frame = encode(&Message::Seed(SeedMsg { seed: 7 })).unwrap();
        assert_eq!(&frame[..2], &SEED_MESSAGE_ID.to_le_bytes());
        let frame = encode(&Message::Time(TimeMsg { angle: 1.0 })).unwrap();
        assert_eq!(&frame[..2], &TIME_MESSAGE_ID.to_le_bytes());
    }

    #[test]
    fn snapshot_survives_compression() {
        let snap = snapshot();
        let frame = encode(&Message::Chunk(snap.clone())).unwrap();
        assert!(frame.len() < CHUNK_VOLUME / 4);
        assert_eq!(decode(&frame).unwrap(), Message::Chunk(snap));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode(&[1]), Err(ProtocolError::Truncated(1))));
        assert!(matches!(
            decode(&[0xff, 0xff, 0]),
            Err(ProtocolError::UnknownMessage(0xffff))
        ));
        let mut bad = CHUNK_MESSAGE_ID.to_le_bytes().to_vec();
        bad.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(decode(&bad).is_err());
        // Voxel payload cut short.
        let mut frame = encode(&Message::Voxel(VoxelDelta::new(IVec3::new(1, 2, 3), 4))).unwrap();
        frame.truncate(frame.len() - 1);
        assert!(matches!(decode(&frame), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn oversize_snapshot_is_refused() {
        let snap = ChunkSnapshot {
            pos: IVec3::ZERO,
            block_ids: vec![1; CHUNK_VOLUME * 4],
        };
        let frame = encode(&Message::Chunk(snap)).unwrap();
        assert!(matches!(decode(&frame), Err(ProtocolError::Oversize(_))));
    }

    #[test]
    fn frame_buffer_handles_split_input() {
        let mut stream = Vec::new();
        write_frame(&mut stream, &Message::Seed(SeedMsg { seed: 1 })).unwrap();
        write_frame(&mut stream, &Message::Chunk(snapshot())).unwrap();
        let mut fb = FrameBuffer::new();
        let (a, b) = stream.split_at(7);
        fb.push(a);
        assert!(fb.next_message().is_none());
        fb.push(b);
        assert_eq!(fb.next_message().unwrap().unwrap(), Message::Seed(SeedMsg { seed: 1 }));
        assert!(matches!(fb.next_message(), Some(Ok(Message::Chunk(_)))));
        assert!(fb.next_message().is_none());
        assert_eq!(fb.buffered(), 0);

        fb.push(&u32::MAX.to_le_bytes());
        assert!(matches!(fb.next_message(), Some(Err(ProtocolError::Oversize(_)))));
    }
}
