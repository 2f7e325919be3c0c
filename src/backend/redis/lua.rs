use tokio::sync::OnceCell;

pub(crate) static ADD_SESSION_SCRIPT_HASH: OnceCell<String> = OnceCell::const_new();
pub(crate) static REMOVE_SESSION_SCRIPT_HASH: OnceCell<String> = OnceCell::const_new();
pub(crate) static REMOVE_EXPIRED_SCRIPT_HASH: OnceCell<String> = OnceCell::const_new();

// KEYS[1] = record key, KEYS[2] = expiry index
// ARGV[1] = session id, ARGV[2] = data, ARGV[3] = expires_at (unix microseconds)
pub(crate) static ADD_SESSION_SCRIPT: &str = r#"
    local key = KEYS[1]
    local index = KEYS[2]
    local id = ARGV[1]
    local data = ARGV[2]
    local expires_at = ARGV[3]

    redis.call('HSET', key, 'data', data, 'expires_at', expires_at)
    redis.call('ZADD', index, expires_at, id)

    return 1
"#;

// KEYS[1] = record key, KEYS[2] = expiry index
// ARGV[1] = session id
pub(crate) static REMOVE_SESSION_SCRIPT: &str = r#"
    local key = KEYS[1]
    local index = KEYS[2]
    local id = ARGV[1]

    local deleted = redis.call('DEL', key)
    redis.call('ZREM', index, id)

    return deleted
"#;

// KEYS[1] = expiry index
// ARGV[1] = record key prefix, ARGV[2] = now (unix microseconds)
pub(crate) static REMOVE_EXPIRED_SCRIPT: &str = r#"
    local index = KEYS[1]
    local prefix = ARGV[1]
    local now = ARGV[2]

    local ids = redis.call('ZRANGEBYSCORE', index, '-inf', now)
    local deleted = 0
    for _, id in ipairs(ids) do
        deleted = deleted + redis.call('DEL', prefix .. id)
    end
    redis.call('ZREMRANGEBYSCORE', index, '-inf', now)

    return deleted
"#;
