//! 공통 유틸리티 함수 모듈
//!
//! # Modules
//!
//! - [`helpers`] - 환경 변수 조회, ObjectId 변환
//! - [`display_terminal`] - 터미널 출력 포맷팅 함수들
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::utils::helpers::to_object_id;
//! use crate::utils::display_terminal::print_boxed_title;
//!
//! let id = to_object_id("507f1f77bcf86cd799439011")?;
//! print_boxed_title("System Initialized");
//! ```

pub mod display_terminal;
pub mod helpers;
