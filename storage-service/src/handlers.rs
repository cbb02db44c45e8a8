//! Handler模块
//!
//! 每个端点执行一次对托管后端的直通操作并返回 JSON 信封。

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::{PageQuery, ReconciliationResult};
use common::response::ApiResponse;

use crate::blob::{BlobMetadata, BlobObject};
use crate::fetcher::{JsonRow, RowFetcher};
use crate::kv;
use crate::reconciler::{reconcile, TableInspector};
use crate::state::AppState;

const SERVICE_NAME: &str = "storage-service";

// ---------- hello / health ----------

#[derive(Debug, Deserialize, IntoParams)]
pub struct HelloQuery {
    /// Name to greet (default: World).
    pub name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HelloData {
    pub message: String,
}

/// 问候端点
#[utoipa::path(
    get,
    path = "/api/hello",
    tag = "misc",
    params(HelloQuery),
    responses(
        (status = 200, description = "问候消息", body = ApiResponse<HelloData>)
    )
)]
pub async fn hello(Query(query): Query<HelloQuery>) -> Json<ApiResponse<HelloData>> {
    let name = query.name.unwrap_or_else(|| "World".to_string());
    Json(ApiResponse::ok(HelloData {
        message: format!("Hello, {}!", name),
    }))
}

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "misc",
    responses(
        (status = 200, description = "服务运行正常", body = ApiResponse<HealthData>)
    )
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::ok(HealthData {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// ---------- schema / tables ----------

/// 列出模式注册表与数据库实际表的对账结果
#[utoipa::path(
    get,
    path = "/api/tables",
    tag = "tables",
    responses(
        (status = 200, description = "对账结果", body = ApiResponse<ReconciliationResult>),
        (status = 500, description = "数据库查询失败")
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ReconciliationResult>>> {
    let inspector = TableInspector::new(&state.db, &state.config);
    let live = inspector.live_tables().await?;
    let result = reconcile(&live, &state.registry);
    Ok(Json(ApiResponse::ok(result)))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRowsData {
    /// Logical name the request resolved to.
    pub table: String,
    /// Fetched rows.
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonRow>,
    /// Number of rows in this response (not the table cardinality).
    pub count: usize,
}

/// 按逻辑名（或 snake_case 别名）读取整张表
#[utoipa::path(
    get,
    path = "/api/table-data/{object}",
    tag = "tables",
    params(
        ("object" = String, Path, description = "逻辑表名或 snake_case 别名")
    ),
    responses(
        (status = 200, description = "表数据", body = ApiResponse<TableRowsData>),
        (status = 404, description = "表名无法解析（附带建议）"),
        (status = 500, description = "数据库查询失败")
    )
)]
pub async fn table_data(
    State(state): State<AppState>,
    Path(object): Path<String>,
) -> AppResult<Json<ApiResponse<TableRowsData>>> {
    let fetcher = RowFetcher::new(&state.db, &state.registry);
    let rows = fetcher.fetch_rows(&object, None, None).await?;
    Ok(Json(ApiResponse::ok(TableRowsData {
        table: object,
        count: rows.len(),
        rows,
    })))
}

/// 读取全部系统配置
#[utoipa::path(
    get,
    path = "/api/system-config",
    tag = "tables",
    responses(
        (status = 200, description = "系统配置行", body = ApiResponse<TableRowsData>),
        (status = 500, description = "数据库查询失败")
    )
)]
pub async fn system_config(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TableRowsData>>> {
    let fetcher = RowFetcher::new(&state.db, &state.registry);
    let rows = fetcher.fetch_rows("systemConfig", None, None).await?;
    Ok(Json(ApiResponse::ok(TableRowsData {
        table: "systemConfig".to_string(),
        count: rows.len(),
        rows,
    })))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogPageData {
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonRow>,
    /// Number of rows in this page (not the table cardinality).
    pub count: usize,
    pub page: u32,
    pub limit: u32,
}

/// 分页读取系统日志（按创建时间倒序）
#[utoipa::path(
    get,
    path = "/api/system-logs",
    tag = "tables",
    params(PageQuery),
    responses(
        (status = 200, description = "日志页", body = ApiResponse<LogPageData>),
        (status = 400, description = "分页参数非法"),
        (status = 500, description = "数据库查询失败")
    )
)]
pub async fn system_logs(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<LogPageData>>> {
    page.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let fetcher = RowFetcher::new(&state.db, &state.registry);
    // Ordering comes from the systemLog definition: created_at descending.
    let rows = fetcher.fetch_rows("systemLog", Some(&page), None).await?;
    Ok(Json(ApiResponse::ok(LogPageData {
        count: rows.len(),
        page: page.page,
        limit: page.limit,
        rows,
    })))
}

// ---------- key-value ----------

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct KvListQuery {
    /// SCAN cursor from a previous response (default: start of keyspace).
    #[serde(default)]
    pub cursor: u64,
    /// Scan step size hint.
    #[serde(default = "default_kv_limit")]
    #[validate(range(min = 1, max = 1000, message = "limit must be 1-1000"))]
    pub limit: u32,
}

fn default_kv_limit() -> u32 {
    100
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KvKeysData {
    pub keys: Vec<String>,
    pub count: usize,
    /// Cursor for the next page; 0 when the scan is complete.
    pub cursor: u64,
    pub complete: bool,
}

/// 列出键值存储中的键（游标分页）
#[utoipa::path(
    get,
    path = "/api/kv-keys",
    tag = "kv",
    params(KvListQuery),
    responses(
        (status = 200, description = "键列表", body = ApiResponse<KvKeysData>),
        (status = 500, description = "键值存储不可用")
    )
)]
pub async fn kv_keys(
    State(state): State<AppState>,
    Query(query): Query<KvListQuery>,
) -> AppResult<Json<ApiResponse<KvKeysData>>> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let store = state.kv_store()?;
    let page = store.list_keys(query.cursor, query.limit).await?;
    Ok(Json(ApiResponse::ok(KvKeysData {
        count: page.keys.len(),
        complete: page.complete(),
        cursor: page.cursor,
        keys: page.keys,
    })))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KvValueData {
    pub key: String,
    /// Parsed JSON document, or the raw string when parsing failed.
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    /// Whether `value` is a parsed JSON document.
    pub is_json: bool,
}

/// 读取键值存储中的值（尽力解析为 JSON）
#[utoipa::path(
    get,
    path = "/api/kv-value/{key}",
    tag = "kv",
    params(
        ("key" = String, Path, description = "键名")
    ),
    responses(
        (status = 200, description = "键值", body = ApiResponse<KvValueData>),
        (status = 404, description = "键不存在"),
        (status = 500, description = "键值存储不可用")
    )
)]
pub async fn kv_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<KvValueData>>> {
    let store = state.kv_store()?;
    let raw = store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("key not found: {key}")))?;

    let (value, is_json) = kv::parse_value(raw);
    Ok(Json(ApiResponse::ok(KvValueData { key, value, is_json })))
}

// ---------- blob objects ----------

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub key: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub etag: String,
    pub content_type: String,
}

impl From<BlobObject> for FileItem {
    fn from(obj: BlobObject) -> Self {
        Self {
            key: obj.key,
            size: obj.metadata.size,
            uploaded_at: obj.metadata.uploaded_at,
            etag: obj.metadata.etag,
            content_type: obj.metadata.content_type,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilesData {
    pub files: Vec<FileItem>,
    pub count: usize,
    /// True when the listing was cut off at the listing cap.
    pub truncated: bool,
}

/// 列出对象存储中的文件
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "文件列表", body = ApiResponse<FilesData>),
        (status = 500, description = "对象存储操作失败")
    )
)]
pub async fn list_files(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FilesData>>> {
    let listing = state.blobs.list().await?;
    let files: Vec<FileItem> = listing.objects.into_iter().map(FileItem::from).collect();
    Ok(Json(ApiResponse::ok(FilesData {
        count: files.len(),
        truncated: listing.truncated,
        files,
    })))
}

/// 读取对象元数据（仅响应头）
#[utoipa::path(
    head,
    path = "/api/files/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "对象键")
    ),
    responses(
        (status = 200, description = "元数据响应头"),
        (status = 404, description = "对象不存在")
    )
)]
pub async fn head_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    let meta = state
        .blobs
        .head(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("object not found: {key}")))?;

    Ok((StatusCode::OK, metadata_headers(&meta)).into_response())
}

/// 下载对象（Accept 含 application/json 时返回元数据）
#[utoipa::path(
    get,
    path = "/api/files/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "对象键")
    ),
    responses(
        (status = 200, description = "对象内容或元数据"),
        (status = 404, description = "对象不存在"),
        (status = 500, description = "对象存储操作失败")
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (bytes, meta) = state
        .blobs
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("object not found: {key}")))?;

    // Content negotiation: structured metadata instead of raw bytes.
    if accepts_json(&headers) {
        let item = FileItem::from(BlobObject { key, metadata: meta });
        return Ok(Json(ApiResponse::ok(item)).into_response());
    }

    Ok((StatusCode::OK, metadata_headers(&meta), bytes).into_response())
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutFileData {
    pub key: String,
    pub etag: String,
    pub size: u64,
}

/// 上传对象（要求 Content-Type 且请求体非空）
#[utoipa::path(
    put,
    path = "/api/files/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "对象键")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "对象已存储", body = ApiResponse<PutFileData>),
        (status = 400, description = "缺少 Content-Type 或请求体为空"),
        (status = 500, description = "对象存储操作失败")
    )
)]
pub async fn put_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<PutFileData>>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Type header is required".into()))?
        .to_string();

    if body.is_empty() {
        return Err(AppError::BadRequest("request body must not be empty".into()));
    }

    let meta = state
        .blobs
        .put(&key, body.to_vec(), &content_type, custom_metadata(&headers))
        .await?;

    Ok(Json(ApiResponse::ok(PutFileData {
        key,
        etag: meta.etag,
        size: meta.size,
    })))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileData {
    pub key: String,
}

/// 删除对象（幂等：键不存在也返回成功）
#[utoipa::path(
    delete,
    path = "/api/files/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "对象键")
    ),
    responses(
        (status = 200, description = "对象已删除（或本就不存在）", body = ApiResponse<DeleteFileData>),
        (status = 500, description = "对象存储操作失败")
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<DeleteFileData>>> {
    state.blobs.delete(&key).await?;
    Ok(Json(ApiResponse::ok(DeleteFileData { key })))
}

// ---------- fallback ----------

/// 未匹配路由的 404 信封
pub async fn not_found(uri: axum::http::Uri) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": "API Not Found",
        "path": uri.path(),
        "timestamp": Utc::now(),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

// ---------- helpers ----------

fn metadata_headers(meta: &BlobMetadata) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&format!("\"{}\"", meta.etag)) {
        headers.insert(header::ETAG, v);
    }
    let last_modified = meta.uploaded_at.format("%a, %d %b %Y %H:%M:%S GMT");
    if let Ok(v) = HeaderValue::from_str(&last_modified.to_string()) {
        headers.insert(header::LAST_MODIFIED, v);
    }
    if let Ok(v) = HeaderValue::from_str(&meta.size.to_string()) {
        headers.insert(header::CONTENT_LENGTH, v);
    }
    if let Ok(v) = HeaderValue::from_str(&meta.content_type) {
        headers.insert(header::CONTENT_TYPE, v);
    }
    headers
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

/// Custom object metadata from `x-blob-meta-*` request headers.
fn custom_metadata(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix("x-blob-meta-")?;
            let value = value.to_str().ok()?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_json() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_json(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        assert!(!accepts_json(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(accepts_json(&headers));
    }

    #[test]
    fn test_custom_metadata_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert("x-blob-meta-origin", HeaderValue::from_static("upload"));

        let meta = custom_metadata(&headers);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["origin"], "upload");
    }
}
