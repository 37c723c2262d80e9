// ==========================================
// CRM 联系人导入 - 联系人 Repository 实现
// ==========================================
// 职责: 实现联系人数据访问与批量导入落库（使用 rusqlite）
// 红线: 批量导入整体在一个事务内完成，失败即整体回滚
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::contact::{
    BulkImportRequest, ContactRecord, ExistingContactRef, ImportStats, ParsedContact,
};
use crate::importer::duplicate_matcher::ExistingContactIndex;
use crate::repository::contact_repo::{BulkImportExecutor, ContactRepository};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 批量导入时读取快照的分页大小
const BULK_SNAPSHOT_PAGE_SIZE: usize = 1000;

const SELECT_REF_COLUMNS: &str =
    "contact_id, first_name, last_name, linkedin_url, email, company, position";

// ==========================================
// ContactRepositoryImpl
// ==========================================
pub struct ContactRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ContactRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::connection)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_ref_row(row: &Row) -> rusqlite::Result<ExistingContactRef> {
        Ok(ExistingContactRef {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            linkedin_url: row.get(3)?,
            email: row.get(4)?,
            company: row.get(5)?,
            position: row.get(6)?,
        })
    }

    /// 分页读取全部查重投影（按 rowid 稳定排序）
    fn load_existing_refs(
        conn: &Connection,
        page_size: usize,
    ) -> RepositoryResult<Vec<ExistingContactRef>> {
        let page_size = page_size.max(1);
        let sql = format!(
            "SELECT {} FROM contact ORDER BY rowid LIMIT ?1 OFFSET ?2",
            SELECT_REF_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let mut all = Vec::new();
        let mut offset = 0usize;
        loop {
            let page = stmt
                .query_map(params![page_size as i64, offset as i64], Self::map_ref_row)?
                .collect::<Result<Vec<_>, _>>()?;
            let fetched = page.len();
            all.extend(page);
            debug!(offset, fetched, "读取联系人快照分页");

            if fetched < page_size {
                break;
            }
            offset += fetched;
        }
        Ok(all)
    }

    fn insert_contact_tx(tx: &Transaction, contact: &ParsedContact) -> RepositoryResult<String> {
        let contact_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        tx.execute(
            r#"
            INSERT INTO contact (
                contact_id, first_name, last_name, linkedin_url,
                email, company, position, connected_on, source,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                contact_id,
                contact.first_name,
                contact.last_name,
                contact.linkedin_url,
                contact.email,
                contact.company,
                contact.position,
                contact.connected_on,
                contact.source,
                now,
                now,
            ],
        )?;
        Ok(contact_id)
    }

    /// 覆盖已有记录：必填字段直接覆盖，可选字段缺失时保留原值
    fn update_contact_tx(
        tx: &Transaction,
        contact_id: &str,
        contact: &ParsedContact,
    ) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"
            UPDATE contact SET
                first_name = ?2,
                last_name = ?3,
                linkedin_url = ?4,
                email = COALESCE(?5, email),
                company = COALESCE(?6, company),
                position = COALESCE(?7, position),
                connected_on = COALESCE(?8, connected_on),
                source = ?9,
                updated_at = ?10
            WHERE contact_id = ?1
            "#,
            params![
                contact_id,
                contact.first_name,
                contact.last_name,
                contact.linkedin_url,
                contact.email,
                contact.company,
                contact.position,
                contact.connected_on,
                contact.source,
                Utc::now(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "contact".to_string(),
                id: contact_id.to_string(),
            });
        }
        Ok(())
    }

    fn attach_categories_tx(
        tx: &Transaction,
        contact_id: &str,
        category_ids: &[String],
    ) -> RepositoryResult<()> {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO contact_category (contact_id, category_id) VALUES (?1, ?2)",
        )?;
        for category_id in category_ids {
            stmt.execute(params![contact_id, category_id])?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for ContactRepositoryImpl {
    async fn list_existing_contacts(
        &self,
        page_size: usize,
    ) -> RepositoryResult<Vec<ExistingContactRef>> {
        let conn = self.get_conn()?;
        Self::load_existing_refs(&conn, page_size)
    }

    async fn create_contact(&self, contact: &ParsedContact) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(RepositoryError::transaction)?;
        let contact_id = Self::insert_contact_tx(&tx, contact)?;
        tx.commit().map_err(RepositoryError::transaction)?;
        Ok(contact_id)
    }

    async fn find_contact_by_id(&self, contact_id: &str) -> RepositoryResult<Option<ContactRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT contact_id, first_name, last_name, linkedin_url,
                       email, company, position, connected_on, source,
                       created_at, updated_at
                FROM contact
                WHERE contact_id = ?1
                "#,
                params![contact_id],
                |row| {
                    Ok(ContactRecord {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        linkedin_url: row.get(3)?,
                        email: row.get(4)?,
                        company: row.get(5)?,
                        position: row.get(6)?,
                        connected_on: row.get(7)?,
                        source: row.get(8)?,
                        created_at: row.get(9)?,
                        updated_at: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    async fn list_contact_categories(&self, contact_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT category_id FROM contact_category WHERE contact_id = ?1 ORDER BY category_id",
        )?;
        let ids = stmt
            .query_map(params![contact_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    async fn count_contacts(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contact", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl BulkImportExecutor for ContactRepositoryImpl {
    #[instrument(skip(self, request), fields(contacts = request.contacts.len()))]
    async fn bulk_import(&self, request: BulkImportRequest) -> RepositoryResult<ImportStats> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(RepositoryError::transaction)?;

        // 快照在事务开始时读取一次；本批新建的记录不参与后续碰撞
        let existing = Self::load_existing_refs(&tx, BULK_SNAPSHOT_PAGE_SIZE)?;
        let index = ExistingContactIndex::build(&existing);
        let overwrite: HashSet<&str> = request.overwrite_ids.iter().map(String::as_str).collect();

        let mut stats = ImportStats::default();
        for contact in &request.contacts {
            let hits = index.lookup(contact);

            if hits.is_empty() {
                let contact_id = Self::insert_contact_tx(&tx, contact)?;
                Self::attach_categories_tx(&tx, &contact_id, &request.category_ids)?;
                stats.imported += 1;
                continue;
            }

            match hits
                .iter()
                .find(|(_, record)| overwrite.contains(record.id.as_str()))
            {
                Some((match_type, record)) => {
                    debug!(contact_id = %record.id, %match_type, "覆盖已有联系人");
                    Self::update_contact_tx(&tx, &record.id, contact)?;
                    Self::attach_categories_tx(&tx, &record.id, &request.category_ids)?;
                    stats.updated += 1;
                }
                None => stats.skipped += 1,
            }
        }

        tx.commit().map_err(RepositoryError::transaction)?;
        info!(
            imported = stats.imported,
            updated = stats.updated,
            skipped = stats.skipped,
            "批量导入完成"
        );
        Ok(stats)
    }
}
