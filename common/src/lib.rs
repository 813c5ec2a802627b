//! Inspection Report Common Library
//!
//! 検査データのモデル、セッションストア、参照データ、報告書データ抽出

pub mod elements;
pub mod error;
pub mod export;
pub mod extract;
pub mod layout;
pub mod reference;
pub mod report;
pub mod store;
pub mod types;

pub use elements::{ElementList, InspectedElement, Numbered, UltrasoundJoint};
pub use error::{Error, Result};
pub use extract::{extractor_for, ReportExtractor};
pub use layout::{HeaderMode, PageLayout};
pub use reference::ReferenceData;
pub use report::{PhotoLayout, ReportData, Section};
pub use store::SessionStore;
pub use types::{InspectionMethod, PhotoAttachment, ProjectHeader, Qualification};
