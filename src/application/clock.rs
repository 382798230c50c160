//! 疑似経過時間モジュール
//!
//! CSVのTimestamp列に使う単調クロック。実時間ではなく、
//! 行を書き込むたびに固定ステップを加算した値を刻みます。

/// 固定ステップの疑似クロック
///
/// k行目（0始まり）の値は `step_ms * k` になる。
/// タイムアウトでは進まない（行の書き込みだけがクロックエッジ）。
#[derive(Debug)]
pub struct TickClock {
    elapsed_ms: u64,
    step_ms: u64,
}

impl TickClock {
    /// 指定ステップで新しいクロックを作成
    pub fn new(step_ms: u64) -> Self {
        Self {
            elapsed_ms: 0,
            step_ms,
        }
    }

    /// 現在の疑似経過時間を取得（ミリ秒）
    pub fn current(&self) -> u64 {
        self.elapsed_ms
    }

    /// 1行分クロックを進める
    pub fn advance(&mut self) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(self.step_ms);
    }
}
