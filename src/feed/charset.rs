//! Character set handling for fetched feed documents.
//!
//! Documents are turned into UTF-8 before parsing. The charset comes from a
//! byte order mark, else the `Content-Type` charset parameter, else the XML
//! declaration's `encoding` attribute, else UTF-8. A transcoded document has
//! its declaration relabelled so the parser does not decode it a second time.

use std::ops::Range;

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// How far into a document the XML declaration is looked for.
const DECLARATION_SCAN_LEN: usize = 1024;

/// Decode a response body into UTF-8 text.
///
/// # Examples
///
/// ```
/// use feedwatch::feed::charset::decode_document;
///
/// let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("<title>Новости</title>");
/// let text = decode_document(&bytes, Some("application/rss+xml; charset=windows-1251"));
/// assert_eq!(text, "<title>Новости</title>");
/// ```
pub fn decode_document(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    let encoding = content_type
        .and_then(charset_param)
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);
    decode_with(encoding, bytes)
}

/// Rewrite the `encoding` attribute of a leading XML declaration to UTF-8.
///
/// Text without a declaration, or whose declaration names no encoding, is
/// returned unchanged.
pub fn relabel_declaration(text: &str) -> String {
    let Some(declaration) = declaration_range(text) else {
        return text.to_string();
    };
    let Some(value) = encoding_value_range(&text[declaration.clone()]) else {
        return text.to_string();
    };

    let start = declaration.start + value.start;
    let end = declaration.start + value.end;
    let mut relabelled = String::with_capacity(text.len());
    relabelled.push_str(&text[..start]);
    relabelled.push_str("UTF-8");
    relabelled.push_str(&text[end..]);
    relabelled
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("Replaced malformed {} sequences", encoding.name());
    }

    if encoding == UTF_8 {
        text.into_owned()
    } else {
        debug!("Transcoded document from {}", encoding.name());
        relabel_declaration(&text)
    }
}

/// Encoding named by the `charset` parameter of a media type.
fn charset_param(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches('"').as_bytes())
    })
}

/// Encoding named by the XML declaration at the start of `bytes`.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    // The declaration is ASCII in every encoding looked for here.
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(DECLARATION_SCAN_LEN)]);
    let declaration = &head[declaration_range(&head)?];
    let value = encoding_value_range(declaration)?;
    Encoding::for_label(declaration[value].as_bytes())
}

/// Byte range of an XML declaration preceded by nothing but whitespace.
fn declaration_range(text: &str) -> Option<Range<usize>> {
    let start = text.find("<?xml")?;
    if !text[..start].trim().is_empty() {
        return None;
    }
    let end = start + text[start..].find("?>")? + 2;
    Some(start..end)
}

/// Byte range of the `encoding` attribute's value inside a declaration.
fn encoding_value_range(declaration: &str) -> Option<Range<usize>> {
    let attr = declaration.find("encoding")?;
    let after = &declaration[attr + "encoding".len()..];
    let eq = after.find('=')?;
    if !after[..eq].trim().is_empty() {
        return None;
    }

    let value = after[eq + 1..].trim_start();
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let len = value[1..].find(quote)?;
    let start = declaration.len() - value.len() + 1;
    Some(start..start + len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{KOI8_R, WINDOWS_1251};

    const CP1251_DOC: &str = r#"<?xml version="1.0" encoding="windows-1251"?><rss><channel><title>Новости</title></channel></rss>"#;

    fn encode(encoding: &'static Encoding, text: &str) -> Vec<u8> {
        encoding.encode(text).0.into_owned()
    }

    #[test]
    fn test_utf8_passes_through() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?><title>Привет</title>"#;
        assert_eq!(decode_document(doc.as_bytes(), None), doc);
        assert_eq!(
            decode_document(doc.as_bytes(), Some("text/xml; charset=UTF-8")),
            doc
        );
    }

    #[test]
    fn test_declared_encoding_is_honoured() {
        let text = decode_document(&encode(WINDOWS_1251, CP1251_DOC), Some("text/xml"));
        assert!(text.contains("<title>Новости</title>"));
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    }

    #[test]
    fn test_header_charset_wins_over_declaration() {
        let doc = r#"<?xml version="1.0" encoding="windows-1251"?><title>Привет</title>"#;
        let text = decode_document(
            &encode(KOI8_R, doc),
            Some("application/xml; charset=\"KOI8-R\""),
        );
        assert!(text.contains("<title>Привет</title>"));
    }

    #[test]
    fn test_bom_wins_over_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<title>Привет</title>".as_bytes());
        let text = decode_document(&bytes, Some("text/xml; charset=windows-1251"));
        assert_eq!(text, "<title>Привет</title>");
    }

    #[test]
    fn test_unknown_label_falls_back_to_utf8() {
        let doc = r#"<?xml version="1.0" encoding="x-made-up"?><title>Привет</title>"#;
        assert_eq!(
            decode_document(doc.as_bytes(), Some("text/xml; charset=nope")),
            doc
        );
    }

    #[test]
    fn test_relabel_declaration() {
        assert_eq!(
            relabel_declaration("<?xml version='1.0' encoding='koi8-r' ?><rss/>"),
            "<?xml version='1.0' encoding='UTF-8' ?><rss/>"
        );
        assert_eq!(
            relabel_declaration("<?xml version=\"1.0\"?><rss/>"),
            "<?xml version=\"1.0\"?><rss/>"
        );
        assert_eq!(relabel_declaration("<rss/>"), "<rss/>");
        assert_eq!(
            relabel_declaration("<rss><?xml encoding=\"koi8-r\"?></rss>"),
            "<rss><?xml encoding=\"koi8-r\"?></rss>"
        );
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(charset_param("text/xml; charset=windows-1251"), Some(WINDOWS_1251));
        assert_eq!(charset_param("text/xml;CHARSET=koi8-r"), Some(KOI8_R));
        assert_eq!(charset_param("text/xml"), None);
    }
}
