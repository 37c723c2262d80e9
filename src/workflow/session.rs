// ==========================================
// CRM 联系人导入 - 导入会话（状态机）
// ==========================================
// 步骤: UPLOAD → PREVIEW → DUPLICATE_CHECK → CONFIRM → Done
// 约束: 会话是一个值，每个转换函数接收旧值、返回新值
// 红线: 转换函数为纯函数，不做 IO；IO 由控制器负责
// ==========================================

use crate::domain::contact::{
    BulkImportRequest, DuplicateMatch, ImportStats, ParseResult, ParsedContact,
};
use crate::domain::types::WorkflowStep;
use crate::importer::error::{ImportError, ImportResult};
use crate::workflow::error::{WorkflowError, WorkflowResult};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use uuid::Uuid;

// ==========================================
// 文件预检
// ==========================================

/// 已选择的文件（通过预检）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub file_name: String,
    pub size_bytes: u64,
}

/// 文件预检：扩展名 .csv（忽略大小写）且大小不超过上限
///
/// 预检失败的文件不会进入解析
pub fn precheck_file(file_name: &str, size_bytes: u64, max_bytes: u64) -> ImportResult<SelectedFile> {
    let is_csv = Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(ImportError::UnsupportedFormat(file_name.to_string()));
    }

    if size_bytes > max_bytes {
        return Err(ImportError::FileTooLarge {
            size: size_bytes,
            max: max_bytes,
        });
    }

    Ok(SelectedFile {
        file_name: file_name.to_string(),
        size_bytes,
    })
}

// ==========================================
// 取消结果 / 确认页汇总
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelOutcome {
    /// 无进度，已直接丢弃
    Discarded,
    /// 有进度，需要用户二次确认
    ConfirmationRequired { prompt: String },
}

/// 确认页汇总（预期效果，以执行器实际返回为准）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmSummary {
    pub contact_count: usize,
    pub category_ids: Vec<String>,
    pub expected_creates: usize,
    pub expected_updates: usize,
    pub expected_skips: usize,
}

// ==========================================
// ImportSession - 导入会话
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ImportSession {
    pub session_id: String,
    pub step: WorkflowStep,
    pub file: Option<SelectedFile>,
    pub parse_result: Option<ParseResult>,
    pub category_ids: Vec<String>,
    pub duplicates: Vec<DuplicateMatch>,
    pub overwrite_ids: BTreeSet<String>,
    pub last_error: Option<String>,
    pub stats: Option<ImportStats>, // Some = Done（终态）
    pub pending_cancel: bool,
    pub in_flight: bool,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            step: WorkflowStep::Upload,
            file: None,
            parse_result: None,
            category_ids: Vec::new(),
            duplicates: Vec::new(),
            overwrite_ids: BTreeSet::new(),
            last_error: None,
            stats: None,
            pending_cancel: false,
            in_flight: false,
        }
    }

    // ===== 查询 =====

    pub fn is_done(&self) -> bool {
        self.stats.is_some()
    }

    /// 是否已有进度（取消时需要二次确认）
    ///
    /// 上传进行中（文件已选择、正在预检或解析）同样算作有进度
    pub fn has_progress(&self) -> bool {
        self.file.is_some() || self.in_flight || self.step != WorkflowStep::Upload
    }

    /// 当前步骤的"下一步"是否可用
    pub fn can_advance(&self) -> bool {
        if self.is_done() || self.in_flight {
            return false;
        }
        match self.step {
            WorkflowStep::Upload => self
                .parse_result
                .as_ref()
                .map(ParseResult::has_valid_contacts)
                .unwrap_or(false),
            WorkflowStep::Preview => !self.category_ids.is_empty(),
            WorkflowStep::DuplicateCheck | WorkflowStep::Confirm => true,
        }
    }

    pub fn contacts(&self) -> &[ParsedContact] {
        self.parse_result
            .as_ref()
            .map(|r| r.contacts.as_slice())
            .unwrap_or(&[])
    }

    /// 疑似重复涉及的已有联系人 ID
    pub fn matched_existing_ids(&self) -> BTreeSet<&str> {
        self.duplicates
            .iter()
            .map(|m| m.existing_contact.id.as_str())
            .collect()
    }

    /// 错误报告（无解析结果时为空）
    pub fn error_report(&self) -> String {
        self.parse_result
            .as_ref()
            .map(ParseResult::error_report)
            .unwrap_or_default()
    }

    /// 确认页汇总
    pub fn summary(&self) -> WorkflowResult<ConfirmSummary> {
        self.ensure_step(WorkflowStep::Confirm, WorkflowStep::Confirm)?;

        let mut matched: HashMap<&ParsedContact, Vec<&str>> = HashMap::new();
        for m in &self.duplicates {
            matched
                .entry(&m.csv_contact)
                .or_default()
                .push(m.existing_contact.id.as_str());
        }

        let mut summary = ConfirmSummary {
            contact_count: self.contacts().len(),
            category_ids: self.category_ids.clone(),
            expected_creates: 0,
            expected_updates: 0,
            expected_skips: 0,
        };
        for contact in self.contacts() {
            match matched.get(contact) {
                None => summary.expected_creates += 1,
                Some(ids) if ids.iter().any(|id| self.overwrite_ids.contains(*id)) => {
                    summary.expected_updates += 1
                }
                Some(_) => summary.expected_skips += 1,
            }
        }
        Ok(summary)
    }

    // ===== 守卫 =====

    fn ensure_active(&self) -> WorkflowResult<()> {
        if self.is_done() {
            return Err(WorkflowError::SessionCompleted);
        }
        Ok(())
    }

    fn ensure_idle(&self) -> WorkflowResult<()> {
        self.ensure_active()?;
        if self.in_flight {
            return Err(WorkflowError::OperationInProgress);
        }
        if self.pending_cancel {
            return Err(WorkflowError::CancelPending);
        }
        Ok(())
    }

    fn ensure_step(&self, expected: WorkflowStep, target: WorkflowStep) -> WorkflowResult<()> {
        if self.step != expected {
            return Err(WorkflowError::InvalidStateTransition {
                from: self.step.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    /// 离开 PREVIEW 前的检查（控制器在读取快照前调用）
    pub fn ensure_can_leave_preview(&self) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.ensure_step(WorkflowStep::Preview, WorkflowStep::DuplicateCheck)?;
        if self.category_ids.is_empty() {
            return Err(WorkflowError::NoCategorySelected);
        }
        Ok(())
    }

    // ===== 异步操作标记 =====

    /// 标记异步操作开始（拒绝并发重入）
    pub fn begin_operation(mut self) -> WorkflowResult<Self> {
        self.ensure_idle()?;
        self.in_flight = true;
        Ok(self)
    }

    /// 异步操作结束但未产生状态变化（失败路径）
    pub fn end_operation(mut self, error: Option<String>) -> Self {
        self.in_flight = false;
        if error.is_some() {
            self.last_error = error;
        }
        self
    }

    // ===== UPLOAD =====

    /// 记录已通过预检的文件（解析开始前调用，旧结果作废）
    pub fn select_file(mut self, file: SelectedFile) -> WorkflowResult<Self> {
        self.ensure_active()?;
        self.ensure_step(WorkflowStep::Upload, WorkflowStep::Upload)?;
        self.file = Some(file);
        self.parse_result = None;
        self.last_error = None;
        Ok(self)
    }

    /// 接收解析结果（重新上传会替换之前的文件与结果）
    pub fn accept_upload(mut self, file: SelectedFile, result: ParseResult) -> WorkflowResult<Self> {
        self.ensure_active()?;
        self.ensure_step(WorkflowStep::Upload, WorkflowStep::Upload)?;

        self.last_error = if result.has_valid_contacts() {
            None
        } else {
            Some(WorkflowError::NoValidContacts.to_string())
        };
        self.file = Some(file);
        self.parse_result = Some(result);
        self.category_ids.clear();
        self.duplicates.clear();
        self.overwrite_ids.clear();
        self.in_flight = false;
        Ok(self)
    }

    /// 预检失败：不保留任何部分状态
    pub fn reject_upload(mut self, error: &ImportError) -> Self {
        self.file = None;
        self.parse_result = None;
        self.last_error = Some(error.to_string());
        self.in_flight = false;
        self
    }

    pub fn advance_to_preview(mut self) -> WorkflowResult<Self> {
        self.ensure_idle()?;
        self.ensure_step(WorkflowStep::Upload, WorkflowStep::Preview)?;
        if !self.can_advance() {
            return Err(WorkflowError::NoValidContacts);
        }
        self.step = WorkflowStep::Preview;
        self.last_error = None;
        Ok(self)
    }

    // ===== PREVIEW =====

    /// 选择分类/活动（去空白、去重、保持顺序）
    pub fn select_categories<I, S>(mut self, category_ids: I) -> WorkflowResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_idle()?;
        self.ensure_step(WorkflowStep::Preview, WorkflowStep::Preview)?;

        let mut seen = BTreeSet::new();
        self.category_ids = category_ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        Ok(self)
    }

    /// 进入重复检查；无匹配时直接进入 CONFIRM
    pub fn enter_duplicate_check(mut self, duplicates: Vec<DuplicateMatch>) -> WorkflowResult<Self> {
        self.ensure_active()?;
        self.ensure_step(WorkflowStep::Preview, WorkflowStep::DuplicateCheck)?;
        if self.category_ids.is_empty() {
            return Err(WorkflowError::NoCategorySelected);
        }

        self.step = if duplicates.is_empty() {
            WorkflowStep::Confirm
        } else {
            WorkflowStep::DuplicateCheck
        };
        self.duplicates = duplicates;
        self.overwrite_ids.clear();
        self.last_error = None;
        self.in_flight = false;
        Ok(self)
    }

    // ===== DUPLICATE_CHECK =====

    /// 提交覆盖集合（可为空；必须是已匹配的已有联系人 ID）
    pub fn resolve_duplicates<I, S>(mut self, overwrite_ids: I) -> WorkflowResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_idle()?;
        self.ensure_step(WorkflowStep::DuplicateCheck, WorkflowStep::Confirm)?;

        let requested: BTreeSet<String> = overwrite_ids.into_iter().map(Into::into).collect();
        {
            let matched = self.matched_existing_ids();
            if let Some(unknown) = requested.iter().find(|id| !matched.contains(id.as_str())) {
                return Err(WorkflowError::UnknownOverwriteTarget(unknown.clone()));
            }
        }

        self.overwrite_ids = requested;
        self.step = WorkflowStep::Confirm;
        Ok(self)
    }

    // ===== 返回 =====

    pub fn back(mut self) -> WorkflowResult<Self> {
        self.ensure_idle()?;
        let target = match self.step {
            WorkflowStep::Preview => WorkflowStep::Upload,
            WorkflowStep::DuplicateCheck | WorkflowStep::Confirm => WorkflowStep::Preview,
            WorkflowStep::Upload => {
                return Err(WorkflowError::InvalidStateTransition {
                    from: WorkflowStep::Upload.to_string(),
                    to: "PREVIOUS".to_string(),
                })
            }
        };

        if target == WorkflowStep::Preview {
            self.duplicates.clear();
            self.overwrite_ids.clear();
        }
        self.step = target;
        self.last_error = None;
        Ok(self)
    }

    // ===== 取消 =====

    /// 请求取消；无进度直接丢弃，否则等待二次确认
    pub fn request_cancel(mut self) -> WorkflowResult<(Self, CancelOutcome)> {
        self.ensure_active()?;
        if !self.has_progress() {
            return Ok((Self::new(), CancelOutcome::Discarded));
        }
        self.pending_cancel = true;
        let prompt = crate::i18n::t("workflow.cancel_confirm");
        Ok((self, CancelOutcome::ConfirmationRequired { prompt }))
    }

    /// 确认取消：丢弃全部会话状态（新会话 ID，迟到结果据此丢弃）
    pub fn confirm_cancel(self) -> WorkflowResult<Self> {
        if !self.pending_cancel {
            return Err(WorkflowError::CancelNotRequested);
        }
        Ok(Self::new())
    }

    pub fn dismiss_cancel(mut self) -> Self {
        self.pending_cancel = false;
        self
    }

    // ===== CONFIRM =====

    /// 开始提交：生成批量请求并标记进行中
    pub fn begin_commit(mut self) -> WorkflowResult<(Self, BulkImportRequest)> {
        self.ensure_idle()?;
        self.ensure_step(WorkflowStep::Confirm, WorkflowStep::Confirm)?;
        if self.contacts().is_empty() {
            return Err(WorkflowError::NoValidContacts);
        }
        if self.category_ids.is_empty() {
            return Err(WorkflowError::NoCategorySelected);
        }

        let request = BulkImportRequest {
            contacts: self.contacts().to_vec(),
            category_ids: self.category_ids.clone(),
            overwrite_ids: self.overwrite_ids.iter().cloned().collect(),
        };
        self.in_flight = true;
        self.last_error = None;
        Ok((self, request))
    }

    pub fn commit_succeeded(mut self, stats: ImportStats) -> Self {
        self.in_flight = false;
        self.pending_cancel = false;
        self.last_error = None;
        self.stats = Some(stats);
        self
    }

    /// 提交失败：停留在 CONFIRM，可重试
    pub fn commit_failed(mut self, message: String) -> Self {
        self.in_flight = false;
        self.last_error = Some(message);
        self
    }
}
