//! 検査方法ごとの報告書ジェネレーター
//!
//! データ抽出は共通ライブラリの抽出器に任せ、ここではページ構成の違い
//! （ヘッダーを毎ページ出すか）だけを決める。

use super::pdf::{render_pdf, RenderOptions};
use crate::error::Result;
use inspection_report_common::extract::extractor_for;
use inspection_report_common::layout::HeaderMode;
use inspection_report_common::{InspectionMethod, ReportData, SessionStore};

pub trait ReportGenerator {
    fn method(&self) -> InspectionMethod;

    fn header_mode(&self) -> HeaderMode {
        HeaderMode::FirstPageOnly
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData> {
        Ok(extractor_for(self.method()).extract(store)?)
    }

    fn render(&self, store: &SessionStore, options: &RenderOptions) -> Result<Vec<u8>> {
        let data = self.extract(store)?;
        render_pdf(&data, self.header_mode(), options)
    }
}

pub struct VisualReport;
pub struct PenetrantReport;
pub struct MagneticReport;
pub struct UltrasoundReport;

impl ReportGenerator for VisualReport {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Visual
    }

    fn header_mode(&self) -> HeaderMode {
        HeaderMode::EveryPage
    }
}

impl ReportGenerator for PenetrantReport {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Penetrant
    }
}

impl ReportGenerator for MagneticReport {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::MagneticParticle
    }
}

impl ReportGenerator for UltrasoundReport {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Ultrasound
    }
}

pub fn generator_for(method: InspectionMethod) -> Box<dyn ReportGenerator> {
    match method {
        InspectionMethod::Visual => Box::new(VisualReport),
        InspectionMethod::Penetrant => Box::new(PenetrantReport),
        InspectionMethod::MagneticParticle => Box::new(MagneticReport),
        InspectionMethod::Ultrasound => Box::new(UltrasoundReport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_methods_and_header_modes() {
        for method in InspectionMethod::ALL {
            let generator = generator_for(method);
            assert_eq!(generator.method(), method);
            let expected = if method == InspectionMethod::Visual {
                HeaderMode::EveryPage
            } else {
                HeaderMode::FirstPageOnly
            };
            assert_eq!(generator.header_mode(), expected);
        }
    }

    #[test]
    fn test_missing_block_is_an_error() {
        let store = SessionStore::new();
        assert!(generator_for(InspectionMethod::Penetrant).extract(&store).is_err());
    }
}
