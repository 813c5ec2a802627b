//! 溶接検査（VT/PT/MT/UT）のデータ入力とPDF報告書生成

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod scanner;
