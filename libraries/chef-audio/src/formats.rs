//! Supported container/codec capability table
//!
//! What the compiled-in backends can do: Symphonia decodes, hound encodes.
//! The render pipeline consults this table up front so a bad selection fails
//! before any file I/O.

/// Decode/encode capability for one extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatSupport {
    pub ext: &'static str,
    pub description: &'static str,
    pub can_decode: bool,
    pub can_encode: bool,
}

/// Every extension either backend recognizes
pub const SUPPORTED_AUDIO_FORMATS: &[AudioFormatSupport] = &[
    AudioFormatSupport {
        ext: "wav",
        description: "Waveform Audio",
        can_decode: true,
        can_encode: true,
    },
    AudioFormatSupport {
        ext: "flac",
        description: "Free Lossless Audio Codec",
        can_decode: true,
        can_encode: false,
    },
    AudioFormatSupport {
        ext: "mp3",
        description: "MPEG-1 Layer III",
        can_decode: true,
        can_encode: false,
    },
    AudioFormatSupport {
        ext: "ogg",
        description: "Ogg Vorbis",
        can_decode: true,
        can_encode: false,
    },
    AudioFormatSupport {
        ext: "aac",
        description: "Advanced Audio Coding",
        can_decode: true,
        can_encode: false,
    },
    AudioFormatSupport {
        ext: "m4a",
        description: "MPEG-4 Audio",
        can_decode: true,
        can_encode: false,
    },
];

fn lookup(ext: &str) -> Option<&'static AudioFormatSupport> {
    SUPPORTED_AUDIO_FORMATS
        .iter()
        .find(|format| format.ext.eq_ignore_ascii_case(ext))
}

/// Whether files with this extension can be decoded (case-insensitive)
pub fn can_decode(ext: &str) -> bool {
    lookup(ext).is_some_and(|format| format.can_decode)
}

/// Whether this extension is a valid encode target (case-insensitive)
pub fn can_encode(ext: &str) -> bool {
    lookup(ext).is_some_and(|format| format.can_encode)
}

/// Extensions accepted as inputs
pub fn decodable_extensions() -> Vec<&'static str> {
    SUPPORTED_AUDIO_FORMATS
        .iter()
        .filter(|format| format.can_decode)
        .map(|format| format.ext)
        .collect()
}

/// Extensions accepted as encode targets
pub fn encodable_extensions() -> Vec<&'static str> {
    SUPPORTED_AUDIO_FORMATS
        .iter()
        .filter(|format| format.can_encode)
        .map(|format| format.ext)
        .collect()
}
