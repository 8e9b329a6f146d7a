//! Logical voice names and their ElevenLabs voice ids.

use phf::phf_map;

/// Voice used when neither the agent profile nor the client names one.
pub const DEFAULT_VOICE: &str = "eleven-rachel";

/// Logical voice name → ElevenLabs voice id
pub static VOICE_ALIAS_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "eleven-rachel" => "21m00Tcm4TlvDq8ikWAM",
    "eleven-domi" => "AZnzlk1mvXvNF0XQwSqT",
    "eleven-bella" => "EXAVITQu4vr4xnSDxMaL",
    "eleven-antoni" => "ErXwobaYp0eMQ54XLiQy",
    "eleven-elli" => "MF3mGyEYCHltNiPm4XZK",
    "eleven-josh" => "TxGEqnHWrfWFTfGW9XjX",
    "eleven-arnold" => "VR6AewLVsFNTJdrC4xPG",
    "eleven-adam" => "pFZP5JQG7iQjIQuC4Hyc",
    "eleven-sam" => "yoZ06aMxZJJ28mfd3POQ",
};

/// Resolve a logical voice name to a provider voice id.
///
/// Names not in the alias table are assumed to already be provider ids and
/// are returned unchanged. A blank name resolves to [`DEFAULT_VOICE`].
#[inline]
pub fn resolve_voice_id(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return VOICE_ALIAS_MAP
            .get(DEFAULT_VOICE)
            .copied()
            .unwrap_or(DEFAULT_VOICE);
    }
    VOICE_ALIAS_MAP.get(trimmed).copied().unwrap_or(trimmed)
}

/// Whether `name` is one of the known logical aliases.
pub fn is_known_alias(name: &str) -> bool {
    VOICE_ALIAS_MAP.contains_key(name.trim())
}
