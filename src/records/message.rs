//! Player messages (type 40).

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::text::{pack_text, unpack_text};

/// Player-to-player message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub spare: [u8; 4],
    /// 0 is the host, players count from 1
    pub sender: u16,
    /// 0 is everyone
    pub recipient: u16,
    pub reply_to: u16,
    pub text: String,
    pub trailing: Vec<u8>,
}

impl Message {
    pub fn sender_name(&self) -> String {
        match self.sender {
            0 => "Host".to_string(),
            n => format!("Player {}", n),
        }
    }

    pub fn recipient_name(&self) -> String {
        match self.recipient {
            0 => "Everyone".to_string(),
            n => format!("Player {}", n),
        }
    }
}

impl RecordCodec for Message {
    const MIN_LEN: usize = 12;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let spare = c.array::<4>()?;
        let sender = c.u16()?;
        let recipient = c.u16()?;
        let reply_to = c.u16()?;
        let len = c.u16()? as usize;
        let text = unpack_text(c.bytes(len)?)?;
        Ok(Message {
            spare,
            sender,
            recipient,
            reply_to,
            text,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let body = pack_text(&self.text);
        let mut out = Vec::with_capacity(Self::MIN_LEN + body.len() + self.trailing.len());
        out.extend_from_slice(&self.spare);
        push16(&mut out, self.sender);
        push16(&mut out, self.recipient);
        push16(&mut out, self.reply_to);
        push16(&mut out, body.len() as u16);
        out.extend_from_slice(&body);
        out.extend_from_slice(&self.trailing);
        out
    }
}
