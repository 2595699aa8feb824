// ==========================================
// 公司概况导入器 - 导入告警输出
// ==========================================
// 职责: 注入式告警接口，替代全局日志对象
// 用途: 单元格降级、整行跳过都通过 WarningSink 上报，
//       上报只是建议性的，不会中断导入
// ==========================================

use crate::domain::ImportWarning;
use std::sync::Mutex;
use tracing::warn;

/// 告警上下文（行号 + 列名）
#[derive(Debug, Clone, Copy, Default)]
pub struct WarningContext<'a> {
    pub row_number: Option<usize>,
    pub column: Option<&'a str>,
}

impl<'a> WarningContext<'a> {
    pub fn row(row_number: usize) -> Self {
        Self {
            row_number: Some(row_number),
            column: None,
        }
    }

    pub fn cell(row_number: usize, column: &'a str) -> Self {
        Self {
            row_number: Some(row_number),
            column: Some(column),
        }
    }
}

// ==========================================
// WarningSink Trait
// ==========================================
// 实现者: TracingWarningSink, CollectingWarningSink, TeeWarningSink
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str, context: WarningContext<'_>);
}

/// 转发到 tracing 的告警输出
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, message: &str, context: WarningContext<'_>) {
        warn!(
            row_number = ?context.row_number,
            column = context.column.unwrap_or("-"),
            "{}",
            message
        );
    }
}

/// 内存收集告警，导入结束后汇总进报告
#[derive(Debug, Default)]
pub struct CollectingWarningSink {
    warnings: Mutex<Vec<ImportWarning>>,
}

impl CollectingWarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取走已收集的告警
    pub fn take(&self) -> Vec<ImportWarning> {
        self.warnings
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<ImportWarning> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl WarningSink for CollectingWarningSink {
    fn warn(&self, message: &str, context: WarningContext<'_>) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(ImportWarning {
                row_number: context.row_number,
                column: context.column.map(str::to_string),
                message: message.to_string(),
            });
        }
    }
}

/// 同时写入两个输出
pub struct TeeWarningSink<'a> {
    first: &'a dyn WarningSink,
    second: &'a dyn WarningSink,
}

impl<'a> TeeWarningSink<'a> {
    pub fn new(first: &'a dyn WarningSink, second: &'a dyn WarningSink) -> Self {
        Self { first, second }
    }
}

impl WarningSink for TeeWarningSink<'_> {
    fn warn(&self, message: &str, context: WarningContext<'_>) {
        self.first.warn(message, context);
        self.second.warn(message, context);
    }
}
