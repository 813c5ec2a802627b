//! 外観検査（VT）の抽出

use super::{elements_table, load_block, text_box, CommonText, ReportExtractor};
use crate::error::Result;
use crate::export::pdf_core::build_header_fields;
use crate::report::{PhotoLayout, ReportData, ReportHeader, Section, SectionNumbering};
use crate::store::SessionStore;
use crate::types::{InspectionMethod, PhaseCheck, VisualBlock};

pub const VISUAL_TITLE: &str = "INFORME INSPECCIÓN VISUAL";

/// フェーズ名のキーワードで分類したチェック項目
#[derive(Debug, Default)]
struct PhaseGroups<'a> {
    before: Vec<&'a PhaseCheck>,
    start: Vec<&'a PhaseCheck>,
    after: Vec<&'a PhaseCheck>,
}

fn group_phases(phases: &[PhaseCheck]) -> PhaseGroups<'_> {
    let mut groups = PhaseGroups::default();
    for check in phases {
        let phase = check.phase.to_uppercase();
        if phase.contains("ANTES DE INICIAR") {
            groups.before.push(check);
        } else if phase.contains("INICIO") {
            groups.start.push(check);
        } else if phase.contains("DESPUÉS") || phase.contains("DESPUES") {
            groups.after.push(check);
        } else {
            log::debug!("ignoring phase without known keyword: {}", check.phase);
        }
    }
    groups
}

fn checklist_rows(checks: &[&PhaseCheck]) -> Vec<(String, String)> {
    checks
        .iter()
        .map(|c| {
            (
                format!("{} - {} - {}", c.item, c.applies, c.effective_result()),
                c.observation.clone(),
            )
        })
        .collect()
}

pub struct VisualExtractor;

impl ReportExtractor for VisualExtractor {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Visual
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData> {
        let method = self.method();
        let block: VisualBlock = load_block(store, method)?;
        let project = store.project_header()?;
        let text = CommonText::new(&block.common, method, &project);

        let mut numbering = SectionNumbering::new();
        let mut sections = vec![
            text_box(
                numbering.title("PROCEDIMIENTO:"),
                vec![format!("Procedimiento: {}", text.procedure)],
            ),
            text_box(
                numbering.title("NORMAS PARA EL CRITERIO DE EVALUACIÓN:"),
                vec![text.norm.clone()],
            ),
            text_box(numbering.title("EQUIPOS UTILIZADOS"), vec![text.equipment.clone()]),
            text_box(numbering.title("MATERIAL BASE:"), vec![text.base_material.clone()]),
        ];

        let groups = group_phases(&block.phases);
        for (name, checks) in [
            ("ANTES DE INICIAR EL PROCESO DE SOLDADURA", &groups.before),
            ("INICIO DE LA JUNTA", &groups.start),
            ("DESPUÉS DE LA SOLDADURA", &groups.after),
        ] {
            if !checks.is_empty() {
                sections.push(Section::Checklist {
                    title: numbering.title(name),
                    rows: checklist_rows(checks),
                });
            }
        }

        if !block.elements.is_empty() {
            sections.push(elements_table(
                numbering.title("ELEMENTOS INSPECCIONADOS:"),
                &block.elements,
                method,
            ));
        }

        for (name, body) in [
            ("DETALLE DE ELEMENTOS INSPECCIONADOS Y RESULTADOS:", &block.common.detail_results),
            ("OBSERVACIONES GENERALES:", &block.common.general_observations),
        ] {
            if !body.trim().is_empty() {
                sections.push(Section::Paragraph {
                    title: numbering.title(name),
                    body: body.clone(),
                });
            }
        }

        let (left, right) = build_header_fields(&project, &text.welding_processes, &text.welding_types);

        // 画像のない記録は写真欄に出さない
        let photos = block
            .common
            .photos
            .into_iter()
            .filter(|p| p.data.is_some())
            .collect();

        Ok(ReportData {
            method,
            header: ReportHeader {
                title: VISUAL_TITLE.to_string(),
                norm: text.norm,
                left,
                right,
            },
            sections,
            photo_heading: numbering.title("REGISTRO FOTOGRÁFICO:"),
            photos,
            scheme: store.scheme()?,
            photo_layout: PhotoLayout::TwoColumn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::InspectedElement;
    use crate::types::PhotoAttachment;

    fn store_with(block: &VisualBlock) -> SessionStore {
        let mut store = SessionStore::new();
        store.put_block("bloque_2_1", block).unwrap();
        store
    }

    #[test]
    fn test_default_block_sections() {
        let report = VisualExtractor.extract(&store_with(&VisualBlock::default())).unwrap();
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            vec![
                "1. PROCEDIMIENTO:",
                "2. NORMAS PARA EL CRITERIO DE EVALUACIÓN:",
                "3. EQUIPOS UTILIZADOS",
                "4. MATERIAL BASE:",
                "5. ANTES DE INICIAR EL PROCESO DE SOLDADURA",
                "6. INICIO DE LA JUNTA",
                "7. DESPUÉS DE LA SOLDADURA",
            ]
        );
        assert_eq!(report.photo_heading, "8. REGISTRO FOTOGRÁFICO:");
        assert_eq!(report.header.title, VISUAL_TITLE);
        assert_eq!(report.photo_layout, PhotoLayout::TwoColumn);
    }

    #[test]
    fn test_dynamic_numbering_skips_empty_sections() {
        let mut block = VisualBlock::default();
        block.phases.retain(|p| p.phase.contains("DESPUÉS"));
        block.common.general_observations = "Sin novedades".into();
        block.elements.add(InspectedElement {
            description: "Columna C-2".into(),
            ..Default::default()
        });

        let report = VisualExtractor.extract(&store_with(&block)).unwrap();
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title()).collect();
        assert_eq!(titles[4], "5. DESPUÉS DE LA SOLDADURA");
        assert_eq!(titles[5], "6. ELEMENTOS INSPECCIONADOS:");
        assert_eq!(titles[6], "7. OBSERVACIONES GENERALES:");
        assert_eq!(titles.len(), 7);
        assert_eq!(report.photo_heading, "8. REGISTRO FOTOGRÁFICO:");
    }

    #[test]
    fn test_not_applicable_checklist_row() {
        let mut block = VisualBlock::default();
        block.phases.truncate(1);
        block.phases[0].applies = "Fuera de Alcance".into();
        block.phases[0].observation = "Sin acceso".into();

        let report = VisualExtractor.extract(&store_with(&block)).unwrap();
        match &report.sections[4] {
            Section::Checklist { rows, .. } => {
                assert_eq!(
                    rows[0].0,
                    "Chequear la calificación del personal - Fuera de Alcance - Fuera de Alcance"
                );
                assert_eq!(rows[0].1, "Sin acceso");
            }
            other => panic!("unexpected section: {:?}", other),
        }
    }

    #[test]
    fn test_photos_without_image_are_skipped() {
        let mut block = VisualBlock::default();
        block.common.photos = vec![
            PhotoAttachment::new("a.jpg", "Junta soldada", vec![0xFF, 0xD8]),
            PhotoAttachment {
                name: "b.jpg".into(),
                ..Default::default()
            },
        ];
        let report = VisualExtractor.extract(&store_with(&block)).unwrap();
        assert_eq!(report.photos.len(), 1);
        assert_eq!(report.photos[0].caption, "Junta soldada");
    }

    #[test]
    fn test_header_uses_welding_lists() {
        let block: VisualBlock = serde_json::from_str(
            r#"{"procesos_soldadura": ["SMAW", "FCAW"], "tipos_soldadura": ["Manual"]}"#,
        )
        .unwrap();
        let report = VisualExtractor.extract(&store_with(&block)).unwrap();
        assert_eq!(report.header.right[3].value, "SMAW, FCAW");
        assert_eq!(report.header.right[4].value, "Manual");
        assert_eq!(report.header.left[0].value, "Cliente");
    }
}
