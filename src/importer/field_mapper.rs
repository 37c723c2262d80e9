// ==========================================
// CRM 联系人导入 - 字段映射器实现
// ==========================================
// 职责: 源表头 → 逻辑列映射（固定导出格式）
// 规则: 表头 TRIM 后大小写敏感匹配；未知列忽略；缺失列整列为空
// ==========================================

use crate::domain::contact::RawRow;
use crate::importer::contact_importer_trait::FieldMapper as FieldMapperTrait;

/// 固定导出格式的列名
pub mod columns {
    pub const FIRST_NAME: &str = "First Name";
    pub const LAST_NAME: &str = "Last Name";
    pub const URL: &str = "URL";
    pub const EMAIL: &str = "Email Address";
    pub const COMPANY: &str = "Company";
    pub const POSITION: &str = "Position";
    pub const CONNECTED_ON: &str = "Connected On";
}

/// 逻辑列 → 源列下标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub url: Option<usize>,
    pub email: Option<usize>,
    pub company: Option<usize>,
    pub position: Option<usize>,
    pub connected_on: Option<usize>,
}

impl HeaderIndex {
    /// 缺失的逻辑列（用于日志提示）
    pub fn missing_columns(&self) -> Vec<&'static str> {
        [
            (self.first_name, columns::FIRST_NAME),
            (self.last_name, columns::LAST_NAME),
            (self.url, columns::URL),
            (self.email, columns::EMAIL),
            (self.company, columns::COMPANY),
            (self.position, columns::POSITION),
            (self.connected_on, columns::CONNECTED_ON),
        ]
        .into_iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| name)
        .collect()
    }
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn build_header_index(&self, headers: &[String]) -> HeaderIndex {
        let mut index = HeaderIndex::default();

        for (col_idx, header) in headers.iter().enumerate() {
            let slot = match header.trim() {
                columns::FIRST_NAME => &mut index.first_name,
                columns::LAST_NAME => &mut index.last_name,
                columns::URL => &mut index.url,
                columns::EMAIL => &mut index.email,
                columns::COMPANY => &mut index.company,
                columns::POSITION => &mut index.position,
                columns::CONNECTED_ON => &mut index.connected_on,
                _ => continue,
            };
            // 重复表头: 第一次出现为准
            if slot.is_none() {
                *slot = Some(col_idx);
            }
        }

        index
    }

    fn map_to_raw_row(&self, index: &HeaderIndex, fields: &[String], row_number: usize) -> RawRow {
        RawRow {
            row_number,
            first_name: self.get_field(fields, index.first_name),
            last_name: self.get_field(fields, index.last_name),
            url: self.get_field(fields, index.url),
            email: self.get_field(fields, index.email),
            company: self.get_field(fields, index.company),
            position: self.get_field(fields, index.position),
            connected_on: self.get_field(fields, index.connected_on),
        }
    }
}

impl FieldMapper {
    /// 提取字段（TRIM）；列缺失或行过短时为空
    fn get_field(&self, fields: &[String], col: Option<usize>) -> String {
        col.and_then(|idx| fields.get(idx))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}
