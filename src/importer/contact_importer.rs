// ==========================================
// CRM 联系人导入 - 解析引擎
// ==========================================
// 职责: 整合解析流程，从文件到 ParseResult
// 流程: 读取 → 解码/分词/映射 → 跳过空白行 → 行校验 → 汇总
// ==========================================

use crate::domain::contact::{ParseResult, RowOutcome};
use crate::importer::contact_importer_trait::{ContactImporter, FileParser, RowValidator};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::CsvParser;
use crate::importer::row_validator::RowValidator as RowValidatorImpl;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

// ==========================================
// ContactCsvImporter - 联系人 CSV 解析引擎
// ==========================================
pub struct ContactCsvImporter {
    file_parser: Box<dyn FileParser>,
    row_validator: Box<dyn RowValidator>,
}

impl ContactCsvImporter {
    /// 创建解析引擎
    ///
    /// # 参数
    /// - file_parser: 文件解析器
    /// - row_validator: 行校验器
    pub fn new(file_parser: Box<dyn FileParser>, row_validator: Box<dyn RowValidator>) -> Self {
        Self {
            file_parser,
            row_validator,
        }
    }
}

impl Default for ContactCsvImporter {
    fn default() -> Self {
        Self::new(
            Box::new(CsvParser::default()),
            Box::new(RowValidatorImpl::default()),
        )
    }
}

#[async_trait]
impl ContactImporter for ContactCsvImporter {
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn parse_csv_file(&self, file_path: &Path) -> ImportResult<ParseResult> {
        let content = tokio::fs::read(file_path).await?;
        debug!(bytes = content.len(), "文件读取完成");
        Ok(self.parse_csv_bytes(&content))
    }

    fn parse_csv_bytes(&self, content: &[u8]) -> ParseResult {
        let start_time = Instant::now();
        let mut result = ParseResult::default();

        for raw in self.file_parser.parse_to_raw_rows(content) {
            match raw {
                Ok(row) => {
                    // 完全空白的行: 静默跳过，不计数
                    if row.is_blank() {
                        debug!(row_number = row.row_number, "跳过空白行");
                        continue;
                    }
                    result.record(self.row_validator.validate_row(&row));
                }
                Err(error) => result.record(RowOutcome::RejectedWithError(error)),
            }
        }

        info!(
            total_rows = result.total_rows,
            valid_rows = result.valid_rows,
            errors = result.errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "联系人解析完成"
        );
        result
    }
}
