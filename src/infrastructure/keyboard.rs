//! Windows キー送出実装（Infrastructure層）
//!
//! SendInput APIを使用してKeyPort traitを実装します。
//! 仮想キーコードではなくKEYEVENTF_UNICODEで文字単位の送出を行うため、
//! キーボードレイアウトに依存しません。

use crate::domain::{DomainError, DomainResult, KeyPort};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};

/// Windowsキー送出アダプタ（Infrastructure層の実装）
pub struct SendInputKeyAdapter;

impl SendInputKeyAdapter {
    /// 新しいSendInputKeyAdapterを作成
    pub fn new() -> Self {
        Self
    }
}

impl Default for SendInputKeyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// UNICODE打鍵イベントを1つ構築
fn unicode_event(unit: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                // KEYEVENTF_UNICODE使用時はwVk=0、文字はwScanに載せる
                wVk: VIRTUAL_KEY(0),
                wScan: unit,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

impl KeyPort for SendInputKeyAdapter {
    fn tap(&mut self, key: char) -> DomainResult<()> {
        // サロゲートペアが必要な文字は1打鍵で表現できないため拒否
        let mut units = [0u16; 2];
        let encoded = key.encode_utf16(&mut units);
        if encoded.len() != 1 {
            return Err(DomainError::KeyDispatch(format!(
                "Key {:?} is outside the Basic Multilingual Plane",
                key
            )));
        }

        let inputs = [
            unicode_event(units[0], KEYEVENTF_UNICODE),
            unicode_event(units[0], KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
        ];

        // SendInputは受理したイベント数を返す（途中でブロックされると減る）
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(DomainError::KeyDispatch(format!(
                "SendInput accepted {} of {} events",
                sent,
                inputs.len()
            )));
        }

        Ok(())
    }

    fn backend_name(&self) -> &str {
        "SendInput"
    }
}
