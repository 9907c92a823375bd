use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use sha1::{Digest, Sha1};

// Key used by the upstream for account passwords (legacy GJP) and most
// obfuscated request fields.
pub const DEFAULT_XOR_KEY: u64 = 37526;

const GJP2_SALT: &str = "mI29fmAnxgTs";

// Upstream tokens arrive with and without trailing padding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChkKind {
    LevelUpload,
    Comment,
    Like,
    Rate,
}

impl ChkKind {
    pub fn key(self) -> u64 {
        match self {
            ChkKind::LevelUpload => 41274,
            ChkKind::Comment => 29481,
            ChkKind::Like | ChkKind::Rate => 58281,
        }
    }

    pub fn salt(self) -> &'static str {
        match self {
            ChkKind::LevelUpload => "xI25fpAapCQg",
            ChkKind::Comment => "xPT6iUrtws0J",
            ChkKind::Like | ChkKind::Rate => "ysg6pUrtjn0J",
        }
    }
}

// Cyclic XOR against the decimal digits of `key`. The digit string of any
// u64 is non-empty, so the modulo below never divides by zero.
fn xor_with_key(data: &[u8], key: u64) -> Vec<u8> {
    let stream = key.to_string().into_bytes();
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ stream[i % stream.len()])
        .collect()
}

pub fn obfuscate(plaintext: &str, key: u64) -> String {
    let xored = xor_with_key(plaintext.as_bytes(), key);
    // URL_SAFE is the standard alphabet with '+' -> '-' and '/' -> '_'.
    general_purpose::URL_SAFE.encode(xored)
}

pub fn obfuscate_default(plaintext: &str) -> String {
    obfuscate(plaintext, DEFAULT_XOR_KEY)
}

pub fn reveal(token: &str, key: u64) -> String {
    let normalized: String = token
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let decoded = match LENIENT_URL_SAFE.decode(normalized.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Obfuscated token is not valid base64: {}", e);
            return String::new();
        }
    };

    String::from_utf8_lossy(&xor_with_key(&decoded, key)).into_owned()
}

pub fn reveal_default(token: &str) -> String {
    reveal(token, DEFAULT_XOR_KEY)
}

pub fn hash(data: &str) -> String {
    hex::encode(Sha1::digest(data.as_bytes()))
}

pub fn gjp2(password: &str) -> String {
    hash(&format!("{}{}", password, GJP2_SALT))
}

pub fn chk<S: AsRef<str>>(values: &[S], key: u64, salt: &str) -> String {
    let mut joined: String = values.iter().map(|v| v.as_ref()).collect();
    joined.push_str(salt);
    obfuscate(&hash(&joined), key)
}

pub fn chk_for<S: AsRef<str>>(kind: ChkKind, values: &[S]) -> String {
    chk(values, kind.key(), kind.salt())
}
