//! 値オブジェクト
//!
//! 生成時に検証を行い、不正な値がドメイン層に入り込まないようにします。

use uuid::Uuid;

use super::error::ValueObjectError;

/// ID 系の値（ルーム ID・ユーザー ID）の最大長
const MAX_IDENTIFIER_LEN: usize = 64;
/// 表示名の最大長
const MAX_DISPLAY_NAME_LEN: usize = 64;
/// メッセージ本文の最大長
pub const MAX_BODY_LEN: usize = 4000;

fn validate_identifier(
    field: &'static str,
    value: String,
    max: usize,
) -> Result<String, ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if value.chars().count() > max {
        return Err(ValueObjectError::TooLong { field, max });
    }
    Ok(value)
}

/// ルーム（学習グループ）ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("room id", value, MAX_IDENTIFIER_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ユーザー ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("user id", value, MAX_IDENTIFIER_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 表示名（メッセージに非正規化して埋め込まれる）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("display name", value, MAX_DISPLAY_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// メッセージ本文
///
/// 空文字は許可する（resource-share の場合）。text の場合の空チェックは
/// `MessageDraft` で行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.chars().count() > MAX_BODY_LEN {
            return Err(ValueObjectError::TooLong {
                field: "message body",
                max: MAX_BODY_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// メッセージ ID（永続化層が採番する。クライアントは採番しない）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("message id", value, MAX_IDENTIFIER_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// MessageId の採番
pub struct MessageIdFactory;

impl MessageIdFactory {
    pub fn generate() -> MessageId {
        MessageId(Uuid::new_v4().to_string())
    }
}

/// WebSocket 接続（セッション）ID。接続ごとにサーバーが採番する
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// SessionId の採番
pub struct SessionIdFactory;

impl SessionIdFactory {
    pub fn generate() -> SessionId {
        SessionId(Uuid::new_v4().to_string())
    }
}

/// Unix タイムスタンプ（ミリ秒、UTC）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
