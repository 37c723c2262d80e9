// ==========================================
// CRM 联系人导入 - 文件解析器实现
// ==========================================
// 阶段 0: 文本解码 → CSV 分词 → 表头映射
// 支持: CSV（逗号分隔，标准引号转义，首行为表头）
// ==========================================

use crate::domain::contact::{RawRow, ValidationError};
use crate::importer::contact_importer_trait::{FieldMapper, FileParser};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use csv::ReaderBuilder;
use tracing::{debug, warn};

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    field_mapper: Box<dyn FieldMapper>,
}

impl CsvParser {
    pub fn new(field_mapper: Box<dyn FieldMapper>) -> Self {
        Self { field_mapper }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(Box::new(FieldMapperImpl))
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, content: &[u8]) -> Vec<Result<RawRow, ValidationError>> {
        // 解码: 去除 BOM，非法字节替换为 U+FFFD（不会失败）
        let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(content);
        if had_errors {
            warn!(encoding = encoding.name(), "文件包含无法解码的字节，已替换");
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = match reader.headers() {
            Ok(record) => record.iter().map(|h| h.trim().to_string()).collect(),
            Err(e) => {
                warn!(error = %e, "表头读取失败，按空文件处理");
                return Vec::new();
            }
        };
        if headers.iter().all(|h| h.is_empty()) {
            warn!("文件无表头，按空文件处理");
            return Vec::new();
        }

        let index = self.field_mapper.build_header_index(&headers);
        let missing = index.missing_columns();
        if !missing.is_empty() {
            warn!(missing = ?missing, "表头缺少部分列，对应字段将为空");
        }

        // 读取所有行（行号从 1 起，不含表头）
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let row_number = row_idx + 1;
            match result {
                Ok(record) => {
                    let fields: Vec<String> = record.iter().map(|v| v.to_string()).collect();
                    rows.push(Ok(self
                        .field_mapper
                        .map_to_raw_row(&index, &fields, row_number)));
                }
                Err(e) => {
                    warn!(row_number, error = %e, "CSV 记录无法读取");
                    rows.push(Err(ValidationError::new(
                        row_number,
                        format!("Unreadable row: {}", e),
                    )));
                }
            }
        }

        debug!(rows = rows.len(), "CSV 分词完成");
        rows
    }
}
