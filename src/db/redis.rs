use redis::Client;

/// Creates a Redis client for the hot recommendation cache
///
/// Connections are established lazily through the multiplexed async
/// connection, so this never blocks startup on an unreachable Redis.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}
