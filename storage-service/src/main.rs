//! 存储绑定 API 服务
//!
//! 在一组托管存储后端之上提供薄 HTTP 直通层，包括：
//! - SQLite 关系存储（表对账、通用行读取）
//! - Redis 键值存储（键扫描、值读取）
//! - 文件系统对象存储（列表、上传、下载、删除）

mod blob;
mod fetcher;
mod handlers;
mod kv;
mod reconciler;
mod registry;
mod routes;
mod state;

use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::no_cache::no_cache_middleware;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "storage-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "存储服务 API",
        version = "0.1.0",
        description = "数据库 / 键值 / 对象存储绑定微服务"
    ),
    paths(
        handlers::hello,
        handlers::health_check,
        handlers::list_tables,
        handlers::table_data,
        handlers::system_config,
        handlers::system_logs,
        handlers::kv_keys,
        handlers::kv_value,
        handlers::list_files,
        handlers::head_file,
        handlers::get_file,
        handlers::put_file,
        handlers::delete_file,
    ),
    components(schemas(
        common::models::ColumnDefinition,
        common::models::ColumnType,
        common::models::MatchedTable,
        common::models::ReconciliationResult,
        common::models::TableDefinition,
        handlers::DeleteFileData,
        handlers::FileItem,
        handlers::FilesData,
        handlers::HealthData,
        handlers::HelloData,
        handlers::KvKeysData,
        handlers::KvValueData,
        handlers::LogPageData,
        handlers::PutFileData,
        handlers::TableRowsData,
    )),
    tags(
        (name = "misc", description = "问候与健康检查端点"),
        (name = "tables", description = "关系存储端点"),
        (name = "kv", description = "键值存储端点"),
        (name = "files", description = "对象存储端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load();

    // 创建应用状态（连接三个存储后端）
    let state = AppState::new(config.clone())
        .await
        .expect("Failed to initialize application state (check DATABASE_URL)");

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await.expect("绑定地址失败");
    axum::serve(listener, app).await.expect("服务启动失败");
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(no_cache_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
