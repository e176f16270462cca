//! KDS configuration

use crate::render::RenderOptions;

/// 厨房显示配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | KDS_KITCHEN_AREA | kitchen | 本屏幕负责的制作区域 |
/// | KDS_EMPTY_TEXT | Waiting for orders | 无订单时显示的文字 |
/// | KDS_COMMAND_BUFFER | 32 | 操作指令通道容量 |
/// | KDS_DEMO_INTERVAL_MS | 5000 | 演示模式下新订单间隔(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | 是否输出 JSON 日志 |
/// | LOG_DIR | (未设置) | 日志文件目录，未设置时仅输出到控制台 |
///
/// # 示例
///
/// ```ignore
/// KDS_KITCHEN_AREA=grill LOG_LEVEL=debug cargo run -p crab-kds
/// ```
#[derive(Debug, Clone)]
pub struct KdsConfig {
    /// 制作区域标签 (大小写不敏感)
    pub kitchen_area: String,
    /// 空看板提示文字
    pub empty_text: String,
    /// 指令通道容量
    pub command_buffer: usize,
    /// 演示订单间隔 (毫秒)
    pub demo_interval_ms: u64,
    /// 日志级别
    pub log_level: String,
    /// JSON 日志
    pub log_json: bool,
    /// 日志目录
    pub log_dir: Option<String>,
}

impl KdsConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kitchen_area: std::env::var("KDS_KITCHEN_AREA").unwrap_or(defaults.kitchen_area),
            empty_text: std::env::var("KDS_EMPTY_TEXT").unwrap_or(defaults.empty_text),
            command_buffer: std::env::var("KDS_COMMAND_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.command_buffer),
            demo_interval_ms: std::env::var("KDS_DEMO_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.demo_interval_ms),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_json),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Set the preparation area shown on this display
    pub fn with_kitchen_area(mut self, area: impl Into<String>) -> Self {
        self.kitchen_area = area.into();
        self
    }

    /// Set the empty-board text
    pub fn with_empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    /// Set the command channel capacity (minimum 1)
    pub fn with_command_buffer(mut self, size: usize) -> Self {
        self.command_buffer = size.max(1);
        self
    }

    /// Set logging options
    pub fn with_logging(mut self, level: impl Into<String>, json: bool, dir: Option<String>) -> Self {
        self.log_level = level.into();
        self.log_json = json;
        self.log_dir = dir;
        self
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            kitchen_area: self.kitchen_area.clone(),
            empty_text: self.empty_text.clone(),
        }
    }
}

impl Default for KdsConfig {
    fn default() -> Self {
        Self {
            kitchen_area: "kitchen".to_string(),
            empty_text: "Waiting for orders".to_string(),
            command_buffer: 32,
            demo_interval_ms: 5000,
            log_level: "info".to_string(),
            log_json: false,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KdsConfig::default();
        assert_eq!(config.kitchen_area, "kitchen");
        assert_eq!(config.command_buffer, 32);
        assert!(!config.log_json);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_builder() {
        let config = KdsConfig::default()
            .with_kitchen_area("grill")
            .with_empty_text("All clear")
            .with_command_buffer(0)
            .with_logging("debug", true, Some("/tmp/kds".into()));

        assert_eq!(config.command_buffer, 1);
        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);

        let options = config.render_options();
        assert_eq!(options.kitchen_area, "grill");
        assert_eq!(options.empty_text, "All clear");
    }
}
