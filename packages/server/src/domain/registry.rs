//! MembershipRegistry trait 定義
//!
//! ルーム所属のストアへのインターフェース。UseCase 層はこの trait に依存します。

use async_trait::async_trait;

use super::{RoomId, SessionId};

/// ルーム所属の登録簿
#[async_trait]
pub trait MembershipRegistry: Send + Sync {
    /// ルームに参加（新規参加なら `true`）
    async fn join(&self, session_id: &SessionId, room_id: &RoomId) -> bool;

    /// ルームから退出（退出した場合 `true`）
    async fn leave(&self, session_id: &SessionId, room_id: &RoomId) -> bool;

    /// セッションの全所属を破棄し、退出したルームを返す
    async fn leave_all(&self, session_id: &SessionId) -> Vec<RoomId>;

    /// ルームに参加中のセッションを取得
    async fn members(&self, room_id: &RoomId) -> Vec<SessionId>;

    /// セッションがルームに参加中か
    async fn is_member(&self, session_id: &SessionId, room_id: &RoomId) -> bool;
}
