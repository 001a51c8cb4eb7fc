//! DTO とドメインモデルの変換
//!
//! DTO の定義自体はクライアントと共有するため `studyhall_shared::dto` にあります。

pub mod conversion;
