#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`component`]: 컬렉터 컴포넌트와 프로세서 빌더
//! - [`modular`]: 리시버 파이프라인/처리 파이프라인 그래프와 YAML 렌더링
//! - [`error`]: 도메인 에러 타입

pub mod component;
pub mod error;
pub mod modular;

// --- 주요 타입 re-export ---

pub use component::Component;
pub use error::OtelError;
pub use modular::{
    CONFIG_FILE_NAME, ExporterType, ModularConfig, Pipeline, ReceiverPipeline,
    ResourceDetectionMode, Signal,
};
