//! CMS 백엔드 메인 애플리케이션
//!
//! 설정 레이어를 병합해 컨테이너를 만들고 모델 계층을 초기화한 뒤,
//! 게시글 리포지토리로 간단한 생성/조회를 수행합니다. 성공 여부와 관계없이
//! 마지막에 종료 작업을 실행합니다.

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};

use cms_backend::config::{load_layers, merge_layers, Environment, IocConfig};
use cms_backend::core::{finalize, init_logging, init_system_with_config, Container};
use cms_backend::domain::entities::posts::PostDoc;
use cms_backend::errors::AppResult;
use cms_backend::repositories::{posts::PostRepo, GetOptions};

#[tokio::main]
async fn main() -> ExitCode {
    // 레이어의 ${MONGODB_URI} 치환 전에 환경 변수가 준비되어야 합니다
    let env_status = load_env_file();

    let config = match build_config() {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            error!("❌ 설정 로드 실패: {}", e);
            return ExitCode::from(1);
        }
    };

    init_logging(config.logger_level());
    info!("{}", env_status);
    info!("🚀 CMS 백엔드 시작중... (environment: {})", Environment::current().name());

    let ioc = match init_system_with_config(config).await {
        Ok(ioc) => ioc,
        Err(e) => {
            error!("❌ 시스템 초기화 실패: {}", e);
            return ExitCode::from(1);
        }
    };

    let outcome = run(&ioc).await;

    if let Err(e) = finalize(&ioc).await {
        warn!("종료 작업 중 오류: {}", e);
    }

    match outcome {
        Ok(()) => {
            info!("👋 정상 종료");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ 실행 실패: {}", e);
            ExitCode::from(1)
        }
    }
}

/// 환경별 설정 레이어를 읽어 하나로 병합합니다.
fn build_config() -> AppResult<IocConfig> {
    let layers = load_layers(&Environment::current())?;
    merge_layers(&layers)
}

/// 애플리케이션 로직
///
/// 게시글 하나를 만들고 다시 조회해서 출력합니다.
async fn run(ioc: &Arc<Container>) -> AppResult<()> {
    info!("Hello world!");

    let posts = ioc.resolve::<PostRepo>()?;
    let created = posts.create(&PostDoc::with_title("test post")).await?;

    if let Some(id) = created.id {
        let found = posts.get(&id, GetOptions::default()).await?;
        info!(
            "📄 {}",
            serde_json::to_string_pretty(&found).unwrap_or_else(|e| e.to_string())
        );
    }

    Ok(())
}

/// PROFILE 환경변수에 따라 .env 파일을 로드합니다.
///
/// 로깅 초기화 전에 호출되므로 결과는 문자열로 돌려주고 호출자가 기록합니다.
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() -> String {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    let file = match profile.as_str() {
        "prod" => ".env.prod",
        "dev" => ".env.dev",
        _ => ".env",
    };

    match dotenv::from_filename(file) {
        Ok(_) => format!("Current profile: {} ({} 파일 로드 됨)", profile, file),
        Err(e) => format!("Current profile: {} ({} 파일 로드 실패: {})", profile, file, e),
    }
}
