//! 터미널 출력 포맷팅 유틸리티
//!
//! 모델 초기화 과정을 단계별로 터미널에 표시합니다.

/// 박스 형태로 둘러싸인 제목을 출력합니다
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║               MODEL INITIALIZATION               ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn print_boxed_title(title: &str) {
    let border = "═".repeat(50);

    println!("╔{}╗", border);
    println!("║{:^50}║", title);
    println!("╚{}╝", border);
}

/// 진행 단계 시작 표시 (`→ Step 1: Connecting`)
pub fn print_step_start(step: u8, description: &str) {
    println!("→ Step {}: {}", step, description);
}

/// 진행 단계 완료 표시 (`✓ Step 1: Schemas discovered (3 items)`)
pub fn print_step_complete(step: u8, description: &str, count: usize) {
    println!("✓ Step {}: {} ({} items)", step, description, count);
}

/// 하위 항목 표시 (`   ├─ model.PostDoc: post`)
pub fn print_sub_task(name: &str, status: &str) {
    println!("   ├─ {}: {}", name, status);
}

/// 모델 초기화 요약
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║             🎉 MODELS INITIALIZED               ║
/// ╚══════════════════════════════════════════════════╝
///    📦 Models: 1
///    🗂  Repositories: 1
///    🔍 Indexes: synced
/// ```
pub fn print_model_summary(models: &[(String, String)], repositories: usize, synced: bool) {
    println!();
    print_boxed_title("🎉 MODELS INITIALIZED");
    for (name, collection) in models {
        print_sub_task(name, collection);
    }
    println!("   📦 Models: {}", models.len());
    println!("   🗂  Repositories: {}", repositories);
    println!("   🔍 Indexes: {}", if synced { "synced" } else { "created" });
    println!();
}
