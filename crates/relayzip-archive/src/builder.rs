//! Deterministic zip writer for fixtures and benchmarks.
//!
//! Writes local headers with fixed timestamps, optionally deferring sizes to
//! data descriptors or widening them through zip64 extra fields. The central
//! directory is written for completeness but carries no extra fields.

use std::io::{self, Write};

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use crate::format::{
    FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, FLAG_UTF8, SIG_CENTRAL_HEADER, SIG_DATA_DESCRIPTOR,
    SIG_END_OF_CENTRAL_DIR, SIG_LOCAL_HEADER,
};

/// One entry to be written by [`ZipBuilder`].
#[derive(Clone, Debug)]
pub struct BuilderEntry {
    name: String,
    payload: Vec<u8>,
    method: u16,
    descriptor: bool,
    descriptor_signature: bool,
    zip64: bool,
    encrypted: bool,
    corrupt_crc: bool,
}

impl BuilderEntry {
    fn new(name: &str, payload: &[u8], method: u16) -> Self {
        Self {
            name: name.to_string(),
            payload: payload.to_vec(),
            method,
            descriptor: false,
            descriptor_signature: true,
            zip64: false,
            encrypted: false,
            corrupt_crc: false,
        }
    }

    pub fn stored(name: &str, payload: &[u8]) -> Self {
        Self::new(name, payload, 0)
    }

    pub fn deflated(name: &str, payload: &[u8]) -> Self {
        Self::new(name, payload, 8)
    }

    /// Zero the header's CRC and sizes and write them after the data instead.
    #[must_use]
    pub fn with_descriptor(mut self) -> Self {
        self.descriptor = true;
        self
    }

    /// Write the data descriptor without its optional signature.
    #[must_use]
    pub fn without_descriptor_signature(mut self) -> Self {
        self.descriptor_signature = false;
        self
    }

    /// Carry sizes in a zip64 extra field (and 8-byte descriptor sizes).
    #[must_use]
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    /// Set the encryption flag. The payload is not actually encrypted.
    #[must_use]
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Record a method code other than the one used to encode the payload.
    #[must_use]
    pub fn method_code(mut self, code: u16) -> Self {
        self.method = code;
        self
    }

    /// Record a CRC-32 that does not match the payload.
    #[must_use]
    pub fn corrupt_crc(mut self) -> Self {
        self.corrupt_crc = true;
        self
    }

    fn flags(&self) -> u16 {
        let mut flags = FLAG_UTF8;
        if self.descriptor {
            flags |= FLAG_DATA_DESCRIPTOR;
        }
        if self.encrypted {
            flags |= FLAG_ENCRYPTED;
        }
        flags
    }

    fn encode(&self) -> io::Result<Vec<u8>> {
        if self.method != 8 {
            return Ok(self.payload.clone());
        }
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.payload)?;
        encoder.finish()
    }

    fn crc32(&self) -> u32 {
        let mut crc = Crc::new();
        crc.update(&self.payload);
        if self.corrupt_crc {
            crc.sum() ^ 0x5a5a_5a5a
        } else {
            crc.sum()
        }
    }
}

/// Builds zip archive bytes entry by entry.
#[derive(Clone, Debug, Default)]
pub struct ZipBuilder {
    entries: Vec<BuilderEntry>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(mut self, entry: BuilderEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn finish(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut cd = Vec::new();

        for entry in &self.entries {
            let data = entry.encode()?;
            let crc = entry.crc32();
            let csize = data.len() as u64;
            let size = entry.payload.len() as u64;
            let name = entry.name.as_bytes();
            let local_offset = out.len() as u32;

            let (head_crc, head_csize, head_usize) = match (entry.descriptor, entry.zip64) {
                (true, false) => (0, 0, 0),
                (true, true) => (0, u32::MAX, u32::MAX),
                (false, true) => (crc, u32::MAX, u32::MAX),
                (false, false) => (crc, csize as u32, size as u32),
            };

            let mut extra = Vec::new();
            if entry.zip64 {
                let (u, c) = if entry.descriptor { (0, 0) } else { (size, csize) };
                extra.extend_from_slice(&1u16.to_le_bytes());
                extra.extend_from_slice(&16u16.to_le_bytes());
                extra.extend_from_slice(&u.to_le_bytes());
                extra.extend_from_slice(&c.to_le_bytes());
            }

            put_u32(&mut out, SIG_LOCAL_HEADER);
            put_u16(&mut out, if entry.zip64 { 45 } else { 20 });
            put_u16(&mut out, entry.flags());
            put_u16(&mut out, entry.method);
            put_u16(&mut out, 0);
            put_u16(&mut out, 0x21);
            put_u32(&mut out, head_crc);
            put_u32(&mut out, head_csize);
            put_u32(&mut out, head_usize);
            put_u16(&mut out, name.len() as u16);
            put_u16(&mut out, extra.len() as u16);
            out.extend_from_slice(name);
            out.extend_from_slice(&extra);
            out.extend_from_slice(&data);

            if entry.descriptor {
                if entry.descriptor_signature {
                    put_u32(&mut out, SIG_DATA_DESCRIPTOR);
                }
                put_u32(&mut out, crc);
                if entry.zip64 {
                    out.extend_from_slice(&csize.to_le_bytes());
                    out.extend_from_slice(&size.to_le_bytes());
                } else {
                    put_u32(&mut out, csize as u32);
                    put_u32(&mut out, size as u32);
                }
            }

            put_u32(&mut cd, SIG_CENTRAL_HEADER);
            put_u16(&mut cd, 20);
            put_u16(&mut cd, 20);
            put_u16(&mut cd, entry.flags());
            put_u16(&mut cd, entry.method);
            put_u16(&mut cd, 0);
            put_u16(&mut cd, 0x21);
            put_u32(&mut cd, crc);
            put_u32(&mut cd, u32::try_from(csize).unwrap_or(u32::MAX));
            put_u32(&mut cd, u32::try_from(size).unwrap_or(u32::MAX));
            put_u16(&mut cd, name.len() as u16);
            put_u16(&mut cd, 0);
            put_u16(&mut cd, 0);
            put_u16(&mut cd, 0);
            put_u16(&mut cd, 0);
            put_u32(&mut cd, 0);
            put_u32(&mut cd, local_offset);
            cd.extend_from_slice(name);
        }

        let cd_start = out.len() as u32;
        out.extend_from_slice(&cd);

        put_u32(&mut out, SIG_END_OF_CENTRAL_DIR);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.entries.len() as u16);
        put_u16(&mut out, self.entries.len() as u16);
        put_u32(&mut out, cd.len() as u32);
        put_u32(&mut out, cd_start);
        put_u16(&mut out, 0);

        Ok(out)
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}
