/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。

use crate::domain::{DomainResult, LogRecord, Reading};

/// センサーポート: シリアル回線からのレコード読み取りを抽象化
pub trait SensorPort: Send {
    /// 1レコード分の読み取りを試みる
    ///
    /// ブロッキング読み取りだが、設定された読み取りタイムアウトで必ず戻る。
    ///
    /// # Returns
    /// - `Ok(Some(Reading))`: 1行の受信とパースに成功
    /// - `Ok(None)`: タイムアウト（行が完結しなかった。受信済みの部分は保持される）
    /// - `Err(DomainError)`: 致命的エラー（切断・入出力失敗・不正レコード）
    fn next_reading(&mut self) -> DomainResult<Option<Reading>>;

    /// 接続先エンドポイントの情報を取得
    fn endpoint(&self) -> EndpointInfo;
}

/// エンドポイント情報
#[derive(Debug, Clone)]
pub struct EndpointInfo {
    pub name: String,
    pub baud_rate: u32,
}

impl EndpointInfo {
    /// ログ表示用の文字列を取得
    pub fn describe(&self) -> String {
        format!("{} @ {} baud", self.name, self.baud_rate)
    }
}

/// キーポート: ホスト入力サブシステムへのキーストローク合成を抽象化
pub trait KeyPort: Send {
    /// 指定キーの押下+解放を1回合成する
    ///
    /// 配達確認や再送は行わない（副作用のみ）。
    ///
    /// # Returns
    /// - `Ok(())`: 送出成功
    /// - `Err(DomainError)`: 送出エラー（入力サブシステム拒否等）
    fn tap(&mut self, key: char) -> DomainResult<()>;

    /// 送出バックエンドの名称を取得
    fn backend_name(&self) -> &str;
}

/// レコードシンク: 観測ログの永続化を抽象化
pub trait RecordSink: Send {
    /// 1行を追記し、ストレージへフラッシュする
    ///
    /// # Returns
    /// - `Ok(())`: 書き込みとフラッシュに成功
    /// - `Err(DomainError)`: 書き込みエラー
    fn append(&mut self, record: &LogRecord) -> DomainResult<()>;

    /// 出力先の表示用文字列を取得
    fn destination(&self) -> String;
}

/// CSVヘッダ行の列名
///
/// 元デバイスのログを解析する既存ツールが列位置でパースするため、
/// 列名の文言はそのまま維持する（第2列"State"にはデバイス側タイム
/// スタンプ、第3列"Reading"には状態文字列が入る）。
pub const CSV_HEADER: [&str; 4] = ["Timestamp (ms)", "State", "Reading", "Click"];

/// CSVヘッダ行を生成するヘルパー
pub fn csv_header_line() -> String {
    CSV_HEADER.join(",")
}

/// LogRecordをCSV1行に変換するヘルパー
///
/// # 行構造（4列）
/// - [0]: 疑似経過時間（ミリ秒）
/// - [1]: デバイス側タイムスタンプ
/// - [2]: 状態文字列
/// - [3]: クリックフラグ（1/0）
pub fn record_to_csv_line(record: &LogRecord) -> String {
    format!(
        "{},{},{},{}",
        record.elapsed_ms,
        escape_csv_field(&record.label),
        escape_csv_field(&record.state),
        record.click_flag()
    )
}

/// カンマ・引用符・改行を含むフィールドをRFC 4180形式でクォート
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
