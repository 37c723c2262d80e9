// ==========================================
// CRM 联系人导入 - 领域类型定义
// ==========================================
// 职责: 查重策略 / 工作流步骤等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 查重策略 (Match Type)
// ==========================================
// 序列化格式: 小写 ("url" / "name")，与前端约定一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Url,  // LinkedIn URL 相同（忽略一个结尾斜杠）
    Name, // 姓名相同（忽略大小写与首尾空白）
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Url => write!(f, "url"),
            MatchType::Name => write!(f, "name"),
        }
    }
}

// ==========================================
// 导入工作流步骤 (Workflow Step)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    Upload,         // 选择文件 + 解析
    Preview,        // 预览 + 选择分类/活动
    DuplicateCheck, // 重复确认
    Confirm,        // 最终确认 + 提交
}

impl WorkflowStep {
    /// 本地化的步骤名称（用于界面展示）
    pub fn label(&self) -> String {
        let key = match self {
            WorkflowStep::Upload => "workflow.step.upload",
            WorkflowStep::Preview => "workflow.step.preview",
            WorkflowStep::DuplicateCheck => "workflow.step.duplicate_check",
            WorkflowStep::Confirm => "workflow.step.confirm",
        };
        crate::i18n::t(key)
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStep::Upload => write!(f, "UPLOAD"),
            WorkflowStep::Preview => write!(f, "PREVIEW"),
            WorkflowStep::DuplicateCheck => write!(f, "DUPLICATE_CHECK"),
            WorkflowStep::Confirm => write!(f, "CONFIRM"),
        }
    }
}
