//! クリックラッチ（Application層）
//!
//! ACTIVE状態への立ち上がりエッジ検出と、連続区間内での
//! クリック多重発行の抑止を提供します。
//!
//! # 使用例
//! センサーがACTIVEを報告し続ける間に1回だけキーを送出する。

use crate::domain::config::LatchPolicy;

/// ラッチの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    /// 非ACTIVE区間（次のACTIVEでクリック発行可能）
    Idle,
    /// ACTIVE区間に入りクリック発行待ち（送出完了は未確認）
    ActiveArmed,
    /// ACTIVE区間内でクリック送出済み（区間が終わるまで抑止）
    ActiveFired,
}

/// 1レコードに対するクリック判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// クリックを発行する
    Fire,
    /// クリックを発行しない
    Suppress,
}

impl ClickDecision {
    /// クリックを発行すべきか
    pub fn should_fire(&self) -> bool {
        matches!(self, ClickDecision::Fire)
    }
}

/// ACTIVE区間ごとのクリック発行を制御するラッチ
///
/// 状態遷移:
/// - `Idle` + ACTIVE → `ActiveArmed`（判定: Fire）
/// - `ActiveArmed` + ACTIVE → `ActiveArmed`（判定: Fire、送出未確認のまま）
/// - `ActiveFired` + ACTIVE → `ActiveFired`（判定: Suppress）
/// - 任意 + 非ACTIVE → ポリシーに従い解除（per-run）または恒久抑止（per-session）
///
/// 送出が完了したら `confirm_fired()` を呼ぶことで `ActiveFired` へ進む。
pub struct ClickLatch {
    state: LatchState,
    policy: LatchPolicy,
}

impl ClickLatch {
    /// デフォルトポリシー（per-run）で新しいラッチを作成
    pub fn new() -> Self {
        Self::with_policy(LatchPolicy::PerRun)
    }

    /// ポリシーを指定して新しいラッチを作成
    pub fn with_policy(policy: LatchPolicy) -> Self {
        Self {
            state: LatchState::Idle,
            policy,
        }
    }

    /// 1レコード分の状態遷移を実行し、クリック判定を返す
    ///
    /// # Arguments
    /// - `active`: レコードの状態フィールドがACTIVEだったか
    ///
    /// # Returns
    /// - `ClickDecision::Fire`: この区間でクリックが未送出（発行すべき）
    /// - `ClickDecision::Suppress`: 発行済みまたは非ACTIVE
    pub fn observe(&mut self, active: bool) -> ClickDecision {
        if active {
            match self.state {
                LatchState::Idle => {
                    self.state = LatchState::ActiveArmed;
                    ClickDecision::Fire
                }
                // 送出未確認のままなら引き続きクリックを負っている
                LatchState::ActiveArmed => ClickDecision::Fire,
                LatchState::ActiveFired => ClickDecision::Suppress,
            }
        } else {
            self.state = match self.policy {
                LatchPolicy::PerRun => LatchState::Idle,
                // 旧実装互換: 非ACTIVEを1行でも見たら以後恒久的に抑止
                LatchPolicy::PerSession => LatchState::ActiveFired,
            };
            ClickDecision::Suppress
        }
    }

    /// クリック送出の完了を記録
    ///
    /// `ActiveArmed` の場合のみ `ActiveFired` へ遷移する。
    pub fn confirm_fired(&mut self) {
        if self.state == LatchState::ActiveArmed {
            self.state = LatchState::ActiveFired;
        }
    }

    /// 現在の状態を取得
    #[allow(dead_code)] // テストで状態遷移を検証するための観測点
    pub fn state(&self) -> LatchState {
        self.state
    }

    /// 状態をリセット
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.state = LatchState::Idle;
    }
}

impl Default for ClickLatch {
    fn default() -> Self {
        Self::new()
    }
}
