/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべての処理で共有される不変の型。

use crate::domain::error::{DomainError, DomainResult};

/// クリック対象と判定する状態フィールドの値（完全一致・大文字小文字区別）
pub const ACTIVE_STATE: &str = "ACTIVE";

/// センサーから受信した1レコード
///
/// ワイヤフォーマット: `"<device_timestamp>,<STATE>,<value>"`
/// デバイス側タイムスタンプは解釈せず、そのままテキストとして保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// デバイス側タイムスタンプ（第1フィールド、不透明なラベル）
    pub label: String,
    /// 状態文字列（第2フィールド）
    pub state: String,
    /// センサー値（第3フィールド、欠落時は空文字列）
    pub value: String,
}

impl Reading {
    /// 1行をパースしてReadingを作成
    ///
    /// 行全体の前後空白は除去するが、各フィールド内の空白は保持する
    /// （`" ACTIVE"`と`"ACTIVE"`は別物）。第4フィールド以降は無視。
    ///
    /// # Arguments
    /// - `line`: 改行終端を含んでもよい1レコード分のテキスト
    ///
    /// # Returns
    /// - `Ok(Reading)`: パース成功（2フィールドの行はvalue空として成功）
    /// - `Err(DomainError::MalformedRecord)`: フィールド数が2未満
    pub fn parse(line: &str) -> DomainResult<Self> {
        let trimmed = line.trim();
        let fields: Vec<&str> = trimmed.split(',').collect();

        if fields.len() < 2 {
            return Err(DomainError::MalformedRecord(format!(
                "expected at least 2 comma-separated fields, got {} in {:?}",
                fields.len(),
                trimmed
            )));
        }

        Ok(Self {
            label: fields[0].to_string(),
            state: fields[1].to_string(),
            value: fields.get(2).copied().unwrap_or("").to_string(),
        })
    }

    /// 状態フィールドがACTIVEかどうか
    pub fn is_active(&self) -> bool {
        self.state == ACTIVE_STATE
    }
}

/// CSVに追記する1行分のログレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// 疑似経過時間（行ごとに固定ステップで加算、実時間ではない）
    pub elapsed_ms: u64,
    /// デバイス側タイムスタンプ（Readingのlabelをそのまま転記）
    pub label: String,
    /// 状態文字列
    pub state: String,
    /// この行でクリックを発行したか
    pub click: bool,
}

impl LogRecord {
    /// Readingとクリック判定から新しいレコードを作成
    pub fn new(elapsed_ms: u64, reading: &Reading, click: bool) -> Self {
        Self {
            elapsed_ms,
            label: reading.label.clone(),
            state: reading.state.clone(),
            click,
        }
    }

    /// クリック列の値（1 = 発行, 0 = 非発行）
    pub fn click_flag(&self) -> u8 {
        if self.click {
            1
        } else {
            0
        }
    }
}
