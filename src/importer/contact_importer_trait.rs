// ==========================================
// CRM 联系人导入 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 文件解析 → 字段映射 → 清洗 → 行校验 → 汇总 → 查重
// ==========================================

use crate::domain::contact::{
    DuplicateMatch, ExistingContactRef, ParseResult, ParsedContact, RawRow, RowOutcome,
    ValidationError,
};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::HeaderIndex;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

// ==========================================
// ContactImporter Trait
// ==========================================
// 用途: 解析引擎主接口（文件 → ParseResult）
// 实现者: ContactCsvImporter
#[async_trait]
pub trait ContactImporter: Send + Sync {
    /// 从 CSV 文件解析联系人
    ///
    /// # 返回
    /// - Ok(ParseResult): 解析结果（行级问题以 errors 形式返回）
    /// - Err: 文件无法读取（不存在/IO 错误）
    async fn parse_csv_file(&self, file_path: &Path) -> ImportResult<ParseResult>;

    /// 从内存字节解析联系人
    ///
    /// # 说明
    /// - 永不失败：无法解码的内容退化为"全部无效行"
    fn parse_csv_bytes(&self, content: &[u8]) -> ParseResult;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文本解码 + CSV 分词 + 表头映射
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析为固定结构的原始行
    ///
    /// # 返回
    /// - Ok(RawRow): 可读取的数据行（可能为空白行，由调用方跳过）
    /// - Err(ValidationError): 分词器无法读取的记录
    fn parse_to_raw_rows(&self, content: &[u8]) -> Vec<Result<RawRow, ValidationError>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 表头 → 逻辑列映射
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 根据表头建立列索引（表头已 TRIM，大小写敏感）
    fn build_header_index(&self, headers: &[String]) -> HeaderIndex;

    /// 将一条记录映射为 RawRow（字段已 TRIM，缺失列为空）
    fn map_to_raw_row(&self, index: &HeaderIndex, fields: &[String], row_number: usize) -> RawRow;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 文本标准化 + 日期/URL 规则
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// TRIM
    fn clean_text(&self, value: &str) -> String;

    /// 空白 → None
    fn normalize_null(&self, value: &str) -> Option<String>;

    /// 解析 Connected On（多格式），失败返回 None
    fn parse_connected_on(&self, value: &str) -> Option<NaiveDate>;

    /// 是否为合法的 LinkedIn 个人主页 URL
    fn is_valid_linkedin_url(&self, value: &str) -> bool;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行校验（纯函数，无 I/O）
// 实现者: RowValidator
pub trait RowValidator: Send + Sync {
    fn validate_row(&self, row: &RawRow) -> RowOutcome;
}

// ==========================================
// DuplicateMatcher Trait
// ==========================================
// 用途: 新联系人 × 已有快照 查重（纯函数，无 I/O）
// 实现者: DuplicateMatcher
pub trait DuplicateMatcher: Send + Sync {
    fn find_duplicates(
        &self,
        contacts: &[ParsedContact],
        existing: &[ExistingContactRef],
    ) -> Vec<DuplicateMatch>;
}
