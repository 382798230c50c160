/// モックセンサーアダプタ
///
/// テスト・開発用のセンサー読み取りモック実装。
/// 事前に与えたスクリプト（行とタイムアウト）を順番に再生する。

use crate::domain::{DomainError, DomainResult, EndpointInfo, Reading, SensorPort};
use crossbeam_channel::Sender;
use std::collections::VecDeque;

/// 再生イベント
#[derive(Debug, Clone)]
#[allow(dead_code)] // バイナリからは未使用（テストがライブラリ経由で使用）
pub enum ScriptEvent {
    /// 1行ぶんの受信レコード（改行除去済み）
    Line(String),
    /// 読み取りタイムアウト
    Timeout,
    /// 回線クローズ（USB抜去等の切断を再現）
    Disconnect,
}

/// モックセンサーアダプタ
///
/// スクリプト消費後はタイムアウトを返し続ける（無送信デバイス相当）。
/// `with_interrupt_on_drain`を指定すると消費しきった時点で割り込みを
/// 1回送るため、統合テストで正常終了経路を再現できる。
#[allow(dead_code)] // バイナリからは未使用（テストがライブラリ経由で使用）
pub struct MockSensorAdapter {
    script: VecDeque<ScriptEvent>,
    interrupt_tx: Option<Sender<()>>,
}

#[allow(dead_code)]
impl MockSensorAdapter {
    /// 行の列からモックを作成
    pub fn from_lines(lines: &[&str]) -> Self {
        Self {
            script: lines
                .iter()
                .map(|l| ScriptEvent::Line((*l).to_string()))
                .collect(),
            interrupt_tx: None,
        }
    }

    /// イベント列からモックを作成（タイムアウト挿入テスト用）
    pub fn from_events(events: Vec<ScriptEvent>) -> Self {
        Self {
            script: events.into(),
            interrupt_tx: None,
        }
    }

    /// スクリプト消費後に割り込みを送るSenderを設定
    pub fn with_interrupt_on_drain(mut self, tx: Sender<()>) -> Self {
        self.interrupt_tx = Some(tx);
        self
    }
}

impl SensorPort for MockSensorAdapter {
    fn next_reading(&mut self) -> DomainResult<Option<Reading>> {
        match self.script.pop_front() {
            Some(ScriptEvent::Line(line)) => Reading::parse(&line).map(Some),
            Some(ScriptEvent::Timeout) => Ok(None),
            Some(ScriptEvent::Disconnect) => Err(DomainError::Serial(
                "Serial stream closed by device (mock)".to_string(),
            )),
            None => {
                if let Some(tx) = self.interrupt_tx.take() {
                    let _ = tx.try_send(());
                }
                Ok(None)
            }
        }
    }

    fn endpoint(&self) -> EndpointInfo {
        EndpointInfo {
            name: "mock".to_string(),
            baud_rate: 115_200,
        }
    }
}
