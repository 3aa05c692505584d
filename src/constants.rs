/// 用户 ID 最大长度（字节）
pub const MAX_USER_ID_LEN: usize = 128;

/// 请求体上限：算法接口只接收小型 JSON
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// x-request-id 最大长度
pub const MAX_REQUEST_ID_LEN: usize = 128;

pub const SERVICE_NAME: &str = "adaptive-backend";
