//! Zip record signatures and little-endian field parsing.

pub(crate) const SIG_LOCAL_HEADER: u32 = 0x0403_4b50;
pub(crate) const SIG_CENTRAL_HEADER: u32 = 0x0201_4b50;
pub(crate) const SIG_END_OF_CENTRAL_DIR: u32 = 0x0605_4b50;
pub(crate) const SIG_ZIP64_END_OF_CENTRAL_DIR: u32 = 0x0606_4b50;
pub(crate) const SIG_DATA_DESCRIPTOR: u32 = 0x0807_4b50;

pub(crate) const LOCAL_HEADER_LEN: usize = 30;

pub(crate) const FLAG_ENCRYPTED: u16 = 0x0001;
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
pub(crate) const FLAG_UTF8: u16 = 0x0800;

const ZIP64_EXTRA_ID: u16 = 0x0001;
const ZIP64_SENTINEL: u32 = 0xFFFF_FFFF;

#[inline]
pub(crate) fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

#[inline]
pub(crate) fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[inline]
pub(crate) fn le_u64(b: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&b[at..at + 8]);
    u64::from_le_bytes(raw)
}

/// Whether a signature marks the start of the trailing central directory.
pub(crate) fn is_archive_trailer(sig: u32) -> bool {
    matches!(
        sig,
        SIG_CENTRAL_HEADER | SIG_END_OF_CENTRAL_DIR | SIG_ZIP64_END_OF_CENTRAL_DIR
    )
}

/// Fixed 30-byte prefix of a local file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LocalHeaderFixed {
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: usize,
    pub extra_len: usize,
}

impl LocalHeaderFixed {
    /// Parse the fixed fields. `b` must start at the signature and hold at
    /// least [`LOCAL_HEADER_LEN`] bytes.
    pub fn parse(b: &[u8]) -> Self {
        debug_assert!(b.len() >= LOCAL_HEADER_LEN);
        debug_assert_eq!(le_u32(b, 0), SIG_LOCAL_HEADER);
        Self {
            flags: le_u16(b, 6),
            method: le_u16(b, 8),
            crc32: le_u32(b, 14),
            compressed_size: le_u32(b, 18),
            uncompressed_size: le_u32(b, 22),
            name_len: le_u16(b, 26) as usize,
            extra_len: le_u16(b, 28) as usize,
        }
    }

    pub fn variable_len(&self) -> usize {
        self.name_len + self.extra_len
    }
}

/// 64-bit sizes from a zip64 extended-information extra field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Zip64Sizes {
    pub uncompressed: Option<u64>,
    pub compressed: Option<u64>,
}

/// Scan an extra-field block for the zip64 record.
///
/// Returns `Ok(None)` if there is no zip64 record and `Err(())` if the
/// block's framing is inconsistent. In a local header the record carries the
/// uncompressed size then the compressed size, each present only when the
/// matching 32-bit field holds the sentinel, or both when the record is long
/// enough to hold both.
pub(crate) fn zip64_sizes(
    extra: &[u8],
    compressed: u32,
    uncompressed: u32,
) -> Result<Option<Zip64Sizes>, ()> {
    let mut at = 0;
    while at + 4 <= extra.len() {
        let id = le_u16(extra, at);
        let len = le_u16(extra, at + 2) as usize;
        let body = extra.get(at + 4..at + 4 + len).ok_or(())?;
        if id == ZIP64_EXTRA_ID {
            return parse_zip64_body(body, compressed, uncompressed).map(Some);
        }
        at += 4 + len;
    }
    Ok(None)
}

fn parse_zip64_body(body: &[u8], compressed: u32, uncompressed: u32) -> Result<Zip64Sizes, ()> {
    let both = body.len() >= 16;
    let mut at = 0;
    let mut next = |wanted: bool| -> Result<Option<u64>, ()> {
        if !wanted {
            return Ok(None);
        }
        if at + 8 > body.len() {
            return Err(());
        }
        let v = le_u64(body, at);
        at += 8;
        Ok(Some(v))
    };
    let uncompressed = next(both || uncompressed == ZIP64_SENTINEL)?;
    let compressed = next(both || compressed == ZIP64_SENTINEL)?;
    Ok(Zip64Sizes {
        uncompressed,
        compressed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra(id: u16, body: &[u8]) -> Vec<u8> {
        let mut out = id.to_le_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn parses_fixed_header_fields() {
        let mut h = vec![0u8; LOCAL_HEADER_LEN];
        h[0..4].copy_from_slice(&SIG_LOCAL_HEADER.to_le_bytes());
        h[6..8].copy_from_slice(&FLAG_DATA_DESCRIPTOR.to_le_bytes());
        h[8..10].copy_from_slice(&8u16.to_le_bytes());
        h[14..18].copy_from_slice(&0xdead_beefu32.to_le_bytes());
        h[18..22].copy_from_slice(&10u32.to_le_bytes());
        h[22..26].copy_from_slice(&20u32.to_le_bytes());
        h[26..28].copy_from_slice(&8u16.to_le_bytes());
        h[28..30].copy_from_slice(&4u16.to_le_bytes());

        let parsed = LocalHeaderFixed::parse(&h);
        assert_eq!(parsed.flags, FLAG_DATA_DESCRIPTOR);
        assert_eq!(parsed.method, 8);
        assert_eq!(parsed.crc32, 0xdead_beef);
        assert_eq!(parsed.compressed_size, 10);
        assert_eq!(parsed.uncompressed_size, 20);
        assert_eq!(parsed.variable_len(), 12);
    }

    #[test]
    fn trailer_signatures() {
        assert!(is_archive_trailer(SIG_CENTRAL_HEADER));
        assert!(is_archive_trailer(SIG_END_OF_CENTRAL_DIR));
        assert!(is_archive_trailer(SIG_ZIP64_END_OF_CENTRAL_DIR));
        assert!(!is_archive_trailer(SIG_LOCAL_HEADER));
        assert!(!is_archive_trailer(SIG_DATA_DESCRIPTOR));
    }

    #[test]
    fn zip64_record_with_both_sizes() {
        let mut body = 5_000_000_000u64.to_le_bytes().to_vec();
        body.extend_from_slice(&4_000_000_000u64.to_le_bytes());
        let mut block = extra(0x5455, &[1, 2, 3, 4, 5]);
        block.extend(extra(ZIP64_EXTRA_ID, &body));

        let sizes = zip64_sizes(&block, u32::MAX, u32::MAX).unwrap().unwrap();
        assert_eq!(sizes.uncompressed, Some(5_000_000_000));
        assert_eq!(sizes.compressed, Some(4_000_000_000));
    }

    #[test]
    fn zip64_record_with_only_the_sentinel_field() {
        let block = extra(ZIP64_EXTRA_ID, &7u64.to_le_bytes());
        let sizes = zip64_sizes(&block, 3, u32::MAX).unwrap().unwrap();
        assert_eq!(sizes.uncompressed, Some(7));
        assert_eq!(sizes.compressed, None);
    }

    #[test]
    fn no_zip64_record() {
        assert_eq!(zip64_sizes(&extra(0x7875, &[0; 11]), 1, 2), Ok(None));
        assert_eq!(zip64_sizes(&[], 1, 2), Ok(None));
    }

    #[test]
    fn overrunning_extra_field_is_rejected() {
        let mut block = extra(ZIP64_EXTRA_ID, &[0; 8]);
        block[2] = 32;
        assert_eq!(zip64_sizes(&block, u32::MAX, 0), Err(()));
    }

    #[test]
    fn short_zip64_record_is_rejected() {
        let block = extra(ZIP64_EXTRA_ID, &[0; 4]);
        assert_eq!(zip64_sizes(&block, u32::MAX, u32::MAX), Err(()));
    }
}
