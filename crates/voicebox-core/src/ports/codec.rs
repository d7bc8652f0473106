//! AudioCodec port - アップロードされた生バイトを保存形式に変換
//!
//! 変換の正しさ自体はこのクレートの対象外です。
//! キャッシュから見れば「bytes を渡すと保存用 bytes が返る、または失敗する」だけ。
//!
//! # 実装
//! - **Mp3Codec**: ヘッダを確認してそのまま通す

use crate::domain::Result;

/// AudioCodec は raw bytes を保存用のエンコード済み bytes に変換
pub trait AudioCodec: Send + Sync {
    /// 保存用 bytes を返す。受け付けられない入力は `CacheError::Codec`
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// 保存ファイルの拡張子（ドットなし）
    fn extension(&self) -> &'static str;

    /// ダウンロード時の Content-Type
    fn content_type(&self) -> &'static str;
}
