use async_trait::async_trait;

use crate::request::ProxyRequest;
use crate::response::{ProxyResponse, UpstreamPassthroughError};

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub trace_id: String,
    /// Outbound proxy URL for this call, if any.
    pub proxy: Option<String>,
}

impl CallContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn call(
        &self,
        req: ProxyRequest,
        ctx: CallContext,
    ) -> Result<ProxyResponse, UpstreamPassthroughError>;
}
