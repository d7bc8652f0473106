//! Mp3Codec - MP3 ペイロードの受け入れ判定
//!
//! 再エンコードはしない。先頭が ID3v2 タグか MPEG オーディオフレームの
//! sync ヘッダであれば、そのままのバイト列を保存用として返す。

use crate::domain::{CacheError, Result};
use crate::ports::AudioCodec;

const ID3_MAGIC: &[u8; 3] = b"ID3";

#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3Codec;

impl Mp3Codec {
    /// 11bit の frame sync + version/layer が予約値でないこと
    fn is_frame_header(bytes: &[u8]) -> bool {
        let [b0, b1, ..] = bytes else {
            return false;
        };
        let sync = *b0 == 0xFF && (*b1 & 0xE0) == 0xE0;
        let version = (*b1 >> 3) & 0b11;
        let layer = (*b1 >> 1) & 0b11;
        sync && version != 0b01 && layer != 0b00
    }
}

impl AudioCodec for Mp3Codec {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        if raw.is_empty() {
            return Err(CacheError::Codec("empty audio payload".to_string()));
        }
        if raw.starts_with(ID3_MAGIC) || Self::is_frame_header(raw) {
            Ok(raw.to_vec())
        } else {
            Err(CacheError::Codec(
                "payload is not an MPEG audio stream".to_string(),
            ))
        }
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }
}
