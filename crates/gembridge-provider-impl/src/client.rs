use std::sync::OnceLock;
use std::time::Duration;

use dashmap::DashMap;

use gembridge_provider_core::UpstreamPassthroughError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    proxy: Option<String>,
    timeout_secs: u64,
}

static CLIENTS: OnceLock<DashMap<ClientKey, wreq::Client>> = OnceLock::new();

/// One pooled client per proxy/timeout pair, built on first use.
pub fn shared_client(
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<wreq::Client, UpstreamPassthroughError> {
    let key = ClientKey {
        proxy: proxy.map(str::trim).filter(|proxy| !proxy.is_empty()).map(str::to_string),
        timeout_secs: timeout.as_secs(),
    };
    let clients = CLIENTS.get_or_init(DashMap::new);
    if let Some(client) = clients.get(&key) {
        return Ok(client.clone());
    }

    let client = build_client(key.proxy.as_deref(), timeout)?;
    clients.insert(key, client.clone());
    Ok(client)
}

fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<wreq::Client, UpstreamPassthroughError> {
    let mut builder = wreq::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = wreq::Proxy::all(proxy).map_err(|err| {
            UpstreamPassthroughError::service_unavailable(format!("invalid proxy `{proxy}`: {err}"))
        })?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|err| UpstreamPassthroughError::service_unavailable(err.to_string()))
}
