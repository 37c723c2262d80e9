// ==========================================
// CRM 联系人导入 - 导入层
// ==========================================
// 职责: 外部联系人导出文件 → 校验后的联系人 + 行级错误 + 疑似重复
// 支持: CSV（固定导出格式）
// ==========================================

// 模块声明
pub mod contact_importer;
pub mod contact_importer_trait;
pub mod data_cleaner;
pub mod duplicate_matcher;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod row_validator;

// 重导出核心类型
pub use contact_importer::ContactCsvImporter;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use duplicate_matcher::DuplicateMatcher as DuplicateMatcherImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::CsvParser;
pub use row_validator::RowValidator as RowValidatorImpl;

// 重导出 Trait 接口
pub use contact_importer_trait::{
    ContactImporter, DataCleaner, DuplicateMatcher, FieldMapper, FileParser, RowValidator,
};
