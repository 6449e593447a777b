use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// 设置文件路径所在的环境变量
pub const SETTINGS_ENV: &str = "PIPESTORE_SETTINGS";

/// 演示程序设置；未提供设置文件时全部取默认值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub table_name: String,
    pub queue_name: String,
    pub container_name: String,
    /// 是否将下单回执归档为 Blob；关闭时对应命令为空操作
    pub archive_receipts: bool,
    /// `RUST_LOG` 缺失时使用的日志过滤器
    pub log_filter: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            table_name: "orders".into(),
            queue_name: "order-events".into(),
            container_name: "order-receipts".into(),
            archive_receipts: true,
            log_filter: "info".into(),
        }
    }
}

impl DemoSettings {
    /// 从 `PIPESTORE_SETTINGS` 指向的 JSON 文件加载；变量未设置时返回默认值
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing settings in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
