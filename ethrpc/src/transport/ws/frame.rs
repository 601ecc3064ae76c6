//! RFC 6455 frame codec, client side.
//!
//! Outbound frames are always masked and final; inbound frames must be
//! unmasked (the server must not mask), carry no RSV bits, and obey the
//! control-frame rules (final, ≤125 payload bytes).

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Payload cap for control frames.
pub(crate) const MAX_CONTROL_PAYLOAD: u64 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    fn from_bits(bits: u8) -> Result<Self, TransportError> {
        match bits {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xa => Ok(Self::Pong),
            other => Err(TransportError::UnsupportedOpcode(other)),
        }
    }

    const fn bits(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xa,
        }
    }

    pub(crate) const fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// Reads one inbound frame, enforcing the client-side validity rules.
pub(crate) async fn read_frame<S>(stream: &mut S) -> Result<Frame, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut head = [0u8; 2];
    stream.read_exact(&mut head).await?;

    let fin = head[0] & 0x80 != 0;
    if head[0] & 0x70 != 0 {
        return Err(TransportError::UnnegotiatedReservedBits);
    }
    let opcode = Opcode::from_bits(head[0] & 0x0f)?;
    if head[1] & 0x80 != 0 {
        return Err(TransportError::MaskedServerMessage);
    }

    let len = match head[1] & 0x7f {
        126 => {
            let mut ext = [0u8; 2];
            stream.read_exact(&mut ext).await?;
            u64::from(u16::from_be_bytes(ext))
        }
        127 => {
            let mut ext = [0u8; 8];
            stream.read_exact(&mut ext).await?;
            u64::from_be_bytes(ext)
        }
        short => u64::from(short),
    };

    if opcode.is_control() {
        if !fin {
            return Err(TransportError::FragmentedControl);
        }
        if len > MAX_CONTROL_PAYLOAD {
            return Err(TransportError::ControlFrameTooBig);
        }
    }

    let len = usize::try_from(len).map_err(|_| TransportError::MessageSizeOverflow)?;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;

    Ok(Frame {
        fin,
        opcode,
        payload,
    })
}

/// Writes one final, masked client frame.
pub(crate) async fn write_frame<S>(
    stream: &mut S,
    opcode: Opcode,
    payload: &[u8],
    mask: [u8; 4],
) -> Result<(), TransportError>
where
    S: AsyncWrite + Unpin,
{
    let mut wire = Vec::with_capacity(14 + payload.len());
    wire.push(0x80 | opcode.bits());

    let len = payload.len();
    if len < 126 {
        wire.push(0x80 | len as u8);
    } else if len <= usize::from(u16::MAX) {
        wire.push(0x80 | 126);
        wire.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        wire.push(0x80 | 127);
        wire.extend_from_slice(&(len as u64).to_be_bytes());
    }
    wire.extend_from_slice(&mask);

    let body_start = wire.len();
    wire.extend_from_slice(payload);
    apply_mask(&mut wire[body_start..], mask);

    stream.write_all(&wire).await?;
    stream.flush().await?;
    Ok(())
}

/// XORs the payload with the 4-byte mask, one u64 lane at a time with a
/// scalar tail. Lane width is a multiple of the mask width, so the tail
/// stays phase-aligned.
pub(crate) fn apply_mask(payload: &mut [u8], mask: [u8; 4]) {
    let lane = u64::from_ne_bytes([
        mask[0], mask[1], mask[2], mask[3], mask[0], mask[1], mask[2], mask[3],
    ]);
    let mut chunks = payload.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let mixed = u64::from_ne_bytes(word) ^ lane;
        chunk.copy_from_slice(&mixed.to_ne_bytes());
    }
    for (offset, byte) in chunks.into_remainder().iter_mut().enumerate() {
        *byte ^= mask[offset % 4];
    }
}
