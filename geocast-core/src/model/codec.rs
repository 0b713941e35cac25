use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// One codec entry of a room's media configuration, handed to the relay
/// engine when the room is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecPreference {
    pub kind: MediaKind,
    pub name: String,
    pub payload_type: u8,
    pub clock_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packetization_mode: Option<u8>,
}

impl CodecPreference {
    /// Codec set for a new room. Opus audio always; mobile connections get
    /// VP8 video, everything else H.264.
    pub fn for_capability(is_mobile: bool) -> Vec<CodecPreference> {
        let mut codecs = vec![CodecPreference {
            kind: MediaKind::Audio,
            name: "audio/opus".to_string(),
            payload_type: 100,
            clock_rate: 48_000,
            channels: Some(2),
            packetization_mode: None,
        }];

        if is_mobile {
            codecs.push(CodecPreference {
                kind: MediaKind::Video,
                name: "video/vp8".to_string(),
                payload_type: 101,
                clock_rate: 90_000,
                channels: None,
                packetization_mode: None,
            });
        } else {
            codecs.push(CodecPreference {
                kind: MediaKind::Video,
                name: "video/h264".to_string(),
                payload_type: 103,
                clock_rate: 90_000,
                channels: None,
                packetization_mode: Some(1),
            });
        }

        codecs
    }
}
