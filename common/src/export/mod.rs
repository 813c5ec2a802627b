//! Export core modules shared by the PDF generators.

pub mod pdf_core;
