//! Tag-length-value framing.
//!
//! Record layout: `tag (fixed width) || u16 LE payload length || payload`. All
//! records of one table share the same tag width; tables are plain
//! concatenations of records in caller order.

use crate::error::{Error, Result};

pub const LENGTH_FIELD: usize = 2;
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlvRecord {
    tag: Vec<u8>,
    payload: Vec<u8>,
}

impl TlvRecord {
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn encoded_len(&self) -> usize {
        self.tag.len() + LENGTH_FIELD + self.payload.len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag);
        // frame() keeps payloads within u16
        out.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.payload);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }
}

pub fn frame(tag: &[u8], payload: &[u8], tag_width: usize) -> Result<TlvRecord> {
    if tag.len() != tag_width {
        return Err(Error::TagWidthMismatch {
            expected: tag_width,
            actual: tag.len(),
        });
    }
    if payload.len() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge(payload.len()));
    }

    Ok(TlvRecord {
        tag: tag.to_vec(),
        payload: payload.to_vec(),
    })
}

pub fn concat<'a>(records: impl IntoIterator<Item = &'a TlvRecord>) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        record.write_to(&mut out);
    }
    out
}

/// Walks a concatenated table without copying payloads
pub struct TlvReader<'a> {
    bytes: &'a [u8],
    tag_width: usize,
    offset: usize,
}

impl<'a> TlvReader<'a> {
    pub fn new(bytes: &'a [u8], tag_width: usize) -> Self {
        Self {
            bytes,
            tag_width,
            offset: 0,
        }
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = Result<(&'a [u8], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let start = self.offset;
        let rest = &self.bytes[start..];
        let header = self.tag_width + LENGTH_FIELD;
        if rest.len() < header {
            self.offset = self.bytes.len();
            return Some(Err(Error::Truncated { offset: start }));
        }

        let (tag, len) = rest[..header].split_at(self.tag_width);
        let len = u16::from_le_bytes([len[0], len[1]]) as usize;
        let Some(payload) = rest.get(header..header + len) else {
            self.offset = self.bytes.len();
            return Some(Err(Error::Truncated { offset: start }));
        };

        self.offset += header + len;
        Some(Ok((tag, payload)))
    }
}

pub fn parse(bytes: &[u8], tag_width: usize) -> Result<Vec<TlvRecord>> {
    TlvReader::new(bytes, tag_width)
        .map(|record| {
            record.map(|(tag, payload)| TlvRecord {
                tag: tag.to_vec(),
                payload: payload.to_vec(),
            })
        })
        .collect()
}

/// Payload of the first record tagged `tag`
pub fn lookup<'a>(bytes: &'a [u8], tag_width: usize, tag: &[u8]) -> Result<Option<&'a [u8]>> {
    for record in TlvReader::new(bytes, tag_width) {
        let (record_tag, payload) = record?;
        if record_tag == tag {
            return Ok(Some(payload));
        }
    }
    Ok(None)
}

/// Records sharing one tag width
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlvTable {
    tag_width: usize,
    records: Vec<TlvRecord>,
}

impl TlvTable {
    pub fn new(tag_width: usize) -> Self {
        Self {
            tag_width,
            records: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8], tag_width: usize) -> Result<Self> {
        Ok(Self {
            tag_width,
            records: parse(bytes, tag_width)?,
        })
    }

    pub fn tag_width(&self) -> usize {
        self.tag_width
    }

    pub fn push(&mut self, tag: &[u8], payload: &[u8]) -> Result<()> {
        self.records.push(frame(tag, payload, self.tag_width)?);
        Ok(())
    }

    pub fn records(&self) -> &[TlvRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, tag: &[u8]) -> Option<&[u8]> {
        self.records
            .iter()
            .find(|record| record.tag == tag)
            .map(TlvRecord::payload)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        concat(&self.records)
    }
}
