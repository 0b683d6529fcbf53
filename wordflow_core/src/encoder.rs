use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::fmt::Write;
use std::sync::{Arc, Mutex};

/// Probability that `random_upper` uppercases a given character.
const RANDOM_UPPER_PROBABILITY: f64 = 0.5;

/// Characters `urlencode` leaves untouched in addition to ASCII alphanumerics.
const URL_SAFE_CHARS: &[u8] = b"_.-~/";

/// An `Encoder` is a named, pure transformation applied to payload content.
///
/// Encoders are looked up by name (or by category) through an
/// [`crate::registry::EncoderLookup`] at the moment a word is produced.
/// They must be total: any input string yields an output string.
pub trait Encoder: Send + Sync {
    /// Unique name used in encoder tokens, e.g. `"base64"`.
    fn name(&self) -> &'static str;

    /// One-line human readable summary, shown when listing encoders.
    fn description(&self) -> &'static str;

    /// Groups this encoder belongs to. A token naming a category fans out
    /// to every encoder listing it.
    fn categories(&self) -> &'static [&'static str] {
        &["default"]
    }

    fn encode(&self, content: &str) -> String;
}

/// Percent-encodes every byte of `content` except ASCII alphanumerics and `safe`.
fn percent_encode(content: &str, safe: &[u8]) -> String {
    let mut out = String::with_capacity(content.len());
    for byte in content.bytes() {
        if byte.is_ascii_alphanumeric() || safe.contains(&byte) {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn join_char_codes(content: &str, prefix: &str, suffix: &str, separator: &str) -> String {
    content
        .chars()
        .map(|c| format!("{prefix}{}{suffix}", c as u32))
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UrlEncoder;

impl Encoder for UrlEncoder {
    fn name(&self) -> &'static str {
        "urlencode"
    }
    fn description(&self) -> &'static str {
        "Replace special characters in string using the %xx escape"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["url_safe", "url"]
    }
    fn encode(&self, content: &str) -> String {
        percent_encode(content, URL_SAFE_CHARS)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DoubleUrlEncoder;

impl Encoder for DoubleUrlEncoder {
    fn name(&self) -> &'static str {
        "double_urlencode"
    }
    fn description(&self) -> &'static str {
        "Applies urlencode twice"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["url_safe", "url"]
    }
    fn encode(&self, content: &str) -> String {
        percent_encode(&percent_encode(content, URL_SAFE_CHARS), URL_SAFE_CHARS)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UriHexEncoder;

impl Encoder for UriHexEncoder {
    fn name(&self) -> &'static str {
        "uri_hex"
    }
    fn description(&self) -> &'static str {
        "Encodes every byte as %xx"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["url"]
    }
    fn encode(&self, content: &str) -> String {
        content.bytes().fold(String::new(), |mut out, byte| {
            let _ = write!(out, "%{byte:02X}");
            out
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UriDoubleHexEncoder;

impl Encoder for UriDoubleHexEncoder {
    fn name(&self) -> &'static str {
        "uri_double_hex"
    }
    fn description(&self) -> &'static str {
        "Encodes every byte as %25xx"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["url"]
    }
    fn encode(&self, content: &str) -> String {
        content.bytes().fold(String::new(), |mut out, byte| {
            let _ = write!(out, "%25{byte:02X}");
            out
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UriUnicodeEncoder;

impl Encoder for UriUnicodeEncoder {
    fn name(&self) -> &'static str {
        "uri_unicode"
    }
    fn description(&self) -> &'static str {
        "Encodes every character as %uxxxx"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["url"]
    }
    fn encode(&self, content: &str) -> String {
        content.chars().fold(String::new(), |mut out, c| {
            let _ = write!(out, "%u{:04X}", c as u32);
            out
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Encoder;

impl Encoder for Base64Encoder {
    fn name(&self) -> &'static str {
        "base64"
    }
    fn description(&self) -> &'static str {
        "Encodes the given string using base64"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["hashes", "default"]
    }
    fn encode(&self, content: &str) -> String {
        BASE64_STANDARD.encode(content.as_bytes())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Encoder;

impl Encoder for Md5Encoder {
    fn name(&self) -> &'static str {
        "md5"
    }
    fn description(&self) -> &'static str {
        "Applies an md5 hash to the given string"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["hashes"]
    }
    fn encode(&self, content: &str) -> String {
        format!("{:x}", md5::compute(content.as_bytes()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HexlifyEncoder;

impl Encoder for HexlifyEncoder {
    fn name(&self) -> &'static str {
        "hexlify"
    }
    fn description(&self) -> &'static str {
        "Every byte of data is converted into the corresponding 2-digit hex representation"
    }
    fn encode(&self, content: &str) -> String {
        content.bytes().fold(String::new(), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rot13Encoder;

impl Encoder for Rot13Encoder {
    fn name(&self) -> &'static str {
        "rot13"
    }
    fn description(&self) -> &'static str {
        "Rotates ASCII letters by 13 places"
    }
    fn encode(&self, content: &str) -> String {
        content
            .chars()
            .map(|c| match c {
                'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
                'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
                _ => c,
            })
            .collect()
    }
}

/// Uppercases characters at random, driven by a seeded ChaCha8 stream so
/// that a run is reproducible for a given seed.
pub struct RandomUpperEncoder {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomUpperEncoder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl Encoder for RandomUpperEncoder {
    fn name(&self) -> &'static str {
        "random_upper"
    }
    fn description(&self) -> &'static str {
        "Replaces random characters in string with its capitals letters"
    }
    fn encode(&self, content: &str) -> String {
        // Poisoning leaves the rng state intact.
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        let mut out = String::with_capacity(content.len());
        for c in content.chars() {
            if rng.random_bool(RANDOM_UPPER_PROBABILITY) {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlEscapeEncoder;

impl Encoder for HtmlEscapeEncoder {
    fn name(&self) -> &'static str {
        "html_escape"
    }
    fn description(&self) -> &'static str {
        "Convert the characters &<>\"' in string to HTML-safe sequences"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["html"]
    }
    fn encode(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        for c in content.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                _ => out.push(c),
            }
        }
        out
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlDecimalEncoder;

impl Encoder for HtmlDecimalEncoder {
    fn name(&self) -> &'static str {
        "html_decimal"
    }
    fn description(&self) -> &'static str {
        "Replaces every character with its &#dd; decimal entity"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["html"]
    }
    fn encode(&self, content: &str) -> String {
        join_char_codes(content, "&#", ";", "")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlHexadecimalEncoder;

impl Encoder for HtmlHexadecimalEncoder {
    fn name(&self) -> &'static str {
        "html_hexadecimal"
    }
    fn description(&self) -> &'static str {
        "Replaces every character with its &#xx; hexadecimal entity"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["html"]
    }
    fn encode(&self, content: &str) -> String {
        content.chars().fold(String::new(), |mut out, c| {
            let _ = write!(out, "&#x{:02x};", c as u32);
            out
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlCharEncoder;

impl Encoder for MysqlCharEncoder {
    fn name(&self) -> &'static str {
        "mysql_char"
    }
    fn description(&self) -> &'static str {
        "Converts string to MySQL CHAR(N,N,...) form"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["db"]
    }
    fn encode(&self, content: &str) -> String {
        format!("CHAR({})", join_char_codes(content, "", "", ","))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlCharEncoder;

impl Encoder for MssqlCharEncoder {
    fn name(&self) -> &'static str {
        "mssql_char"
    }
    fn description(&self) -> &'static str {
        "Converts string to MSSQL CHAR(N)+CHAR(N) form"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["db"]
    }
    fn encode(&self, content: &str) -> String {
        join_char_codes(content, "CHAR(", ")", "+")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleCharEncoder;

impl Encoder for OracleCharEncoder {
    fn name(&self) -> &'static str {
        "oracle_char"
    }
    fn description(&self) -> &'static str {
        "Converts string to Oracle chr(N)||chr(N) form"
    }
    fn categories(&self) -> &'static [&'static str] {
        &["db"]
    }
    fn encode(&self, content: &str) -> String {
        join_char_codes(content, "chr(", ")", "||")
    }
}

/// Returns the built-in encoder family in registration order.
///
/// `seed` drives the encoders that draw random numbers.
pub fn default_encoders(seed: u64) -> Vec<Arc<dyn Encoder>> {
    vec![
        Arc::new(UrlEncoder),
        Arc::new(DoubleUrlEncoder),
        Arc::new(UriHexEncoder),
        Arc::new(UriDoubleHexEncoder),
        Arc::new(UriUnicodeEncoder),
        Arc::new(Base64Encoder),
        Arc::new(Md5Encoder),
        Arc::new(HexlifyEncoder),
        Arc::new(Rot13Encoder),
        Arc::new(RandomUpperEncoder::new(seed)),
        Arc::new(HtmlEscapeEncoder),
        Arc::new(HtmlDecimalEncoder),
        Arc::new(HtmlHexadecimalEncoder),
        Arc::new(MysqlCharEncoder),
        Arc::new(MssqlCharEncoder),
        Arc::new(OracleCharEncoder),
    ]
}
