//! Best-effort content type inference.

use std::path::Path;

/// Type returned when nothing else matches.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// How many leading bytes [`sniff`] looks at.
pub const SNIFF_LEN: usize = 16;

/// Signatures checked against the start of the content, first match wins.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF8", "image/gif"),
    (b"#def", "image/x-bitmap"),
    (b"! XPM2", "image/x-pixmap"),
    (b".snd", "audio/basic"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"OggS", "audio/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\xca\xfe\xba\xbe", "application/java-vm"),
];

/// Infer a MIME type from leading content bytes, then from `name`'s
/// extension. Never fails.
pub fn sniff(header: &[u8], name: &str) -> String {
    sniff_bytes(header)
        .map(str::to_string)
        .unwrap_or_else(|| sniff_name(name))
}

/// MIME type from content signatures alone.
pub fn sniff_bytes(header: &[u8]) -> Option<&'static str> {
    let header = &header[..header.len().min(SNIFF_LEN)];

    if let Some(&(_, mime)) = SIGNATURES.iter().find(|(sig, _)| header.starts_with(sig)) {
        return Some(mime);
    }

    if header.len() >= 12 && header.starts_with(b"RIFF") {
        match &header[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"WAVE" => return Some("audio/x-wav"),
            _ => {}
        }
    }

    sniff_markup(header)
}

/// MIME type from the file name's extension, or [`FALLBACK_MIME`].
pub fn sniff_name(name: &str) -> String {
    mime_guess::from_path(Path::new(name))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// XML and HTML, with or without a byte order mark.
fn sniff_markup(header: &[u8]) -> Option<&'static str> {
    let text: Vec<u8> = if let Some(rest) = header.strip_prefix(b"\xef\xbb\xbf") {
        rest.to_vec()
    } else if let Some(rest) = header.strip_prefix(b"\xfe\xff") {
        narrow_utf16(rest, false)?
    } else if let Some(rest) = header.strip_prefix(b"\xff\xfe") {
        narrow_utf16(rest, true)?
    } else {
        header.to_vec()
    };

    if text.starts_with(b"<?xml") {
        return Some("application/xml");
    }
    if text.starts_with(b"<!") {
        return Some("text/html");
    }

    let lower = text.to_ascii_lowercase();
    ["<html", "<head", "<body"]
        .iter()
        .any(|tag| lower.starts_with(tag.as_bytes()))
        .then_some("text/html")
}

/// Collapse ASCII-range UTF-16 code units to single bytes.
fn narrow_utf16(bytes: &[u8], little_endian: bool) -> Option<Vec<u8>> {
    bytes
        .chunks_exact(2)
        .map(|unit| {
            let (lo, hi) = if little_endian {
                (unit[0], unit[1])
            } else {
                (unit[1], unit[0])
            };
            (hi == 0 && lo.is_ascii()).then_some(lo)
        })
        .collect()
}
