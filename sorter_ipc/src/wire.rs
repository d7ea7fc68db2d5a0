//! Peer wire protocol.
//!
//! Every message starts with an 8-byte little-endian [`FrameHeader`]
//! (`bincode` fixed-int encoding). The header's `msg_type` selects the
//! message class:
//!
//! | `msg_type`        | Class              | Body                       | Reply |
//! |-------------------|--------------------|----------------------------|-------|
//! | `0`               | pulse              | none                       | none  |
//! | `0x0001..=0x01FF` | control            | none                       | yes   |
//! | `0x0200`          | event notification | [`EventBody`] (8 bytes)    | yes   |
//! | `0x0201`          | data blob          | `value` bytes              | yes   |
//! | other             | unknown            | none                       | yes   |
//!
//! A reply is a 6-byte [`ReplyHeader`] followed by `len` payload bytes.
//! Success is `status = 0`; errors carry an errno and no payload.

use serde::{Deserialize, Serialize};
use sorter_common::event::{Event, EventKind};
use std::io::{Read, Write};

use crate::error::IpcError;

// ─── Message classes ────────────────────────────────────────────────

/// Pulse: liveness notification, optionally carrying an event.
pub const MSG_PULSE: u16 = 0;
/// First message type reserved for transport control.
pub const MSG_CONTROL_FIRST: u16 = 0x0001;
/// Last message type reserved for transport control.
pub const MSG_CONTROL_LAST: u16 = 0x01FF;
/// Rendezvous request sent by the connecting side.
pub const MSG_CONNECT: u16 = 0x0001;
/// Application message carrying one event.
pub const MSG_EVENT_NOTIFICATION: u16 = 0x0200;
/// Application message carrying raw bytes. Not supported.
pub const MSG_DATA_BLOB: u16 = 0x0201;

// ─── Pulse codes ────────────────────────────────────────────────────

/// Bare liveness pulse.
pub const PULSE_CODE_LIVENESS: u16 = 0;
/// Sender is going away.
pub const PULSE_CODE_DISCONNECT: u16 = 0xFFFF;
/// Wake-up without meaning.
pub const PULSE_CODE_UNBLOCK: u16 = 0xFFFE;

/// Upper bound for a data blob body that is skipped before rejecting it.
pub const MAX_BLOB_LEN: usize = 64 * 1024;

/// Payload of a successful event-notification reply.
pub const REPLY_OK: &[u8] = b"OK";

pub const HEADER_LEN: usize = 8;
pub const BODY_LEN: usize = 8;
pub const REPLY_HEADER_LEN: usize = 6;

// ─── Frames ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub msg_type: u16,
    pub code: u16,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBody {
    pub event_kind: i32,
    pub data: i32,
}

impl From<Event> for EventBody {
    fn from(event: Event) -> Self {
        Self {
            event_kind: event.kind.code(),
            data: event.data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyHeader {
    pub status: i32,
    pub len: u16,
}

/// A decoded inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Pulse { code: u16, value: i32 },
    Control { msg_type: u16 },
    EventNotification(EventBody),
    DataBlob { len: usize },
    Unknown { msg_type: u16 },
}

// ─── Reading ────────────────────────────────────────────────────────

/// Read one message. Data blob bodies are consumed and discarded.
///
/// # Errors
///
/// IO errors (including EOF) are returned as [`IpcError::Io`]; a data blob
/// longer than [`MAX_BLOB_LEN`] is a [`IpcError::Protocol`] error.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame, IpcError> {
    let mut buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut buf)?;
    let header: FrameHeader = bincode::deserialize(&buf)?;

    let frame = match header.msg_type {
        MSG_PULSE => Frame::Pulse {
            code: header.code,
            value: header.value,
        },
        MSG_CONTROL_FIRST..=MSG_CONTROL_LAST => Frame::Control {
            msg_type: header.msg_type,
        },
        MSG_EVENT_NOTIFICATION => {
            let mut body = [0u8; BODY_LEN];
            reader.read_exact(&mut body)?;
            Frame::EventNotification(bincode::deserialize(&body)?)
        }
        MSG_DATA_BLOB => {
            let len = usize::try_from(header.value)
                .ok()
                .filter(|len| *len <= MAX_BLOB_LEN)
                .ok_or_else(|| IpcError::Protocol {
                    reason: format!("data blob length {} out of range", header.value),
                })?;
            std::io::copy(&mut reader.by_ref().take(len as u64), &mut std::io::sink())?;
            Frame::DataBlob { len }
        }
        msg_type => Frame::Unknown { msg_type },
    };
    Ok(frame)
}

/// Read a reply and return `(status, payload)`.
pub fn read_reply<R: Read>(reader: &mut R) -> Result<(i32, Vec<u8>), IpcError> {
    let mut buf = [0u8; REPLY_HEADER_LEN];
    reader.read_exact(&mut buf)?;
    let header: ReplyHeader = bincode::deserialize(&buf)?;
    let mut payload = vec![0u8; header.len as usize];
    reader.read_exact(&mut payload)?;
    Ok((header.status, payload))
}

// ─── Writing ────────────────────────────────────────────────────────

fn send<W: Write>(writer: &mut W, header: FrameHeader, body: &[u8]) -> Result<(), IpcError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    bincode::serialize_into(&mut buf, &header)?;
    buf.extend_from_slice(body);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Send an event as an event-notification message.
pub fn write_event<W: Write>(writer: &mut W, event: Event) -> Result<(), IpcError> {
    let body = bincode::serialize(&EventBody::from(event))?;
    send(
        writer,
        FrameHeader {
            msg_type: MSG_EVENT_NOTIFICATION,
            code: 0,
            value: 0,
        },
        &body,
    )
}

/// Send a pulse.
pub fn write_pulse<W: Write>(writer: &mut W, code: u16, value: i32) -> Result<(), IpcError> {
    send(
        writer,
        FrameHeader {
            msg_type: MSG_PULSE,
            code,
            value,
        },
        &[],
    )
}

/// Send a bodiless message of any type (control or otherwise).
pub fn write_message<W: Write>(writer: &mut W, msg_type: u16) -> Result<(), IpcError> {
    send(
        writer,
        FrameHeader {
            msg_type,
            code: 0,
            value: 0,
        },
        &[],
    )
}

/// Send a data blob.
pub fn write_blob<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), IpcError> {
    let value = i32::try_from(bytes.len()).map_err(|_| IpcError::Protocol {
        reason: format!("data blob of {} bytes too large", bytes.len()),
    })?;
    send(
        writer,
        FrameHeader {
            msg_type: MSG_DATA_BLOB,
            code: 0,
            value,
        },
        bytes,
    )
}

/// Send a reply.
pub fn write_reply<W: Write>(writer: &mut W, status: i32, payload: &[u8]) -> Result<(), IpcError> {
    let len = u16::try_from(payload.len()).map_err(|_| IpcError::Protocol {
        reason: format!("reply payload of {} bytes too large", payload.len()),
    })?;
    let mut buf = Vec::with_capacity(REPLY_HEADER_LEN + payload.len());
    bincode::serialize_into(&mut buf, &ReplyHeader { status, len })?;
    buf.extend_from_slice(payload);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Event carried by an event body, `None` if the kind is unknown.
pub fn body_to_event(body: EventBody) -> Option<Event> {
    EventKind::from_code(body.event_kind).map(|kind| Event::with_data(kind, body.data))
}
