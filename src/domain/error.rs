/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 回復可能な条件はポートの戻り値（Ok(None) = タイムアウト）で表現し、
///   このenumに載るのは実行を中断する失敗のみ

use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum DomainError {
    /// シリアル入出力関連のエラー
    #[error("Serial error: {0}")]
    Serial(String),

    /// 不正なレコード（フィールド数不足など）
    ///
    /// 入力行の形式が契約を満たさない場合。スキップせず実行を中断する。
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// キーストローク送出関連のエラー
    #[error("Key dispatch error: {0}")]
    KeyDispatch(String),

    /// ログ出力（CSV書き込み）関連のエラー
    #[error("Log error: {0}")]
    Log(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// デバイス無応答
    ///
    /// 連続タイムアウト数がしきい値へ到達した状態。
    /// 再接続は行わず、実行終了として報告する。
    #[error("Device silent: no data for {0} consecutive reads")]
    DeviceSilent(u32),

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
