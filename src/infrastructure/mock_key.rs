/// モックキーアダプタ
///
/// テスト・開発用のキー送出モック実装。
/// 送出内容を記録・ログ出力するのみで、実際のキーストローク合成は行わない。
/// SendInputが使えないプラットフォームでの実行時フォールバックも兼ねる。

use crate::domain::{DomainError, DomainResult, KeyPort};

/// モックキーアダプタ
#[allow(dead_code)] // Windowsバイナリでは実装系（SendInput）が使われる
pub struct MockKeyAdapter {
    /// 送出されたキーの履歴
    taps: Vec<char>,
}

#[allow(dead_code)] // バイナリ側ではtaps()を参照しない（テスト用の観測点）
impl MockKeyAdapter {
    /// 新しいモックキーアダプタを作成
    pub fn new() -> Self {
        Self { taps: Vec::new() }
    }

    /// 送出されたキーの履歴を取得
    pub fn taps(&self) -> &[char] {
        &self.taps
    }
}

impl Default for MockKeyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPort for MockKeyAdapter {
    fn tap(&mut self, key: char) -> DomainResult<()> {
        // 実装系（SendInput）と同じ契約: BMP外の文字は1打鍵で表現できない
        if key.len_utf16() != 1 {
            return Err(DomainError::KeyDispatch(format!(
                "Key {:?} is outside the Basic Multilingual Plane",
                key
            )));
        }

        // モック実装: 記録とログ出力のみ
        self.taps.push(key);
        tracing::debug!("MockKey: tap '{}'", key);

        Ok(())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
