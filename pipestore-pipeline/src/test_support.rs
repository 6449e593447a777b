//! 单元测试共用的请求、响应与可失败的存储接收端
use crate::request::Request;
use async_trait::async_trait;
use pipestore_command::options::PayloadBuilder;
use pipestore_command::{PipelineContext, StorageOperation};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub(crate) struct Audit {
    pub text: String,
}

impl Audit {
    pub fn new(text: &str) -> Self {
        Self { text: text.into() }
    }
}

impl Request for Audit {
    const NAME: &'static str = "Audit";
    type Response = AuditResponse;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AuditResponse {
    pub echoed: String,
}

pub(crate) trait Textual {
    fn text(&self) -> &str;
}

impl Textual for Audit {
    fn text(&self) -> &str {
        &self.text
    }
}

impl Textual for AuditResponse {
    fn text(&self) -> &str {
        &self.echoed
    }
}

#[derive(Debug, thiserror::Error)]
#[error("value cannot be null (parameter '{0}')")]
pub(crate) struct NullArgument(pub &'static str);

#[derive(Debug, Default)]
pub(crate) struct Sink {
    written: Mutex<Vec<String>>,
    fail: bool,
}

impl Sink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

/// 将消息文本写入 `Sink` 的测试操作
#[derive(Debug, Default)]
pub(crate) struct SinkWrite;

#[async_trait]
impl<M> StorageOperation<M> for SinkWrite
where
    M: Textual + Send + Sync + 'static,
{
    const NAME: &'static str = "SinkWriteCommand";
    type Client = Arc<Sink>;
    type Payload = String;
    type Output = usize;

    fn default_payload_builder(&self) -> Option<PayloadBuilder<M, String>> {
        Some(Arc::new(
            |message: &M, _ctx: &PipelineContext| -> anyhow::Result<Option<String>> {
                Ok(Some(message.text().to_string()))
            },
        ))
    }

    async fn perform(
        &self,
        client: &Arc<Sink>,
        payload: String,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<usize> {
        if client.fail {
            return Err(NullArgument("boom").into());
        }
        let mut written = client.written.lock().unwrap();
        written.push(payload);
        Ok(written.len())
    }
}
