//! 磁粉探傷（MT）の抽出

use super::penetrant::materials_table;
use super::{
    elements_table, load_block, text_box, text_or, CommonText, ReportExtractor,
    NO_DETAILS_FALLBACK, NO_OBSERVATIONS_FALLBACK,
};
use crate::error::Result;
use crate::export::pdf_core::build_header_fields;
use crate::report::{Column, PhotoLayout, ReportData, ReportHeader, Section, SectionNumbering};
use crate::store::SessionStore;
use crate::types::{InspectionMethod, MagneticBlock, MAGNETIC_MATERIAL_ORDER};

pub const MAGNETIC_TITLE: &str = "INFORME INSPECCIÓN PARTÍCULAS MAGNÉTICAS";
pub const MAGNETIC_KIND: &str = "III - Partículas Magnéticas";

pub struct MagneticExtractor;

impl ReportExtractor for MagneticExtractor {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::MagneticParticle
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData> {
        let method = self.method();
        let block: MagneticBlock = load_block(store, method)?;
        let project = store.project_header()?;
        let text = CommonText::new(&block.common, method, &project);

        let parameter_rows = block
            .parameters
            .iter()
            .map(|p| {
                vec![
                    p.activity.clone(),
                    p.distance.clone(),
                    p.application.clone(),
                    p.lighting.clone(),
                ]
            })
            .collect();

        let mut n = SectionNumbering::new();
        let sections = vec![
            text_box(n.title("PROCEDIMIENTO:"), vec![format!("Procedimiento: {}", text.procedure)]),
            text_box(
                n.title("NORMAS PARA EL CRITERIO DE EVALUACIÓN:"),
                vec![format!("Norma: {}", text.norm)],
            ),
            text_box(n.title("EQUIPOS UTILIZADOS"), vec![text.equipment.clone()]),
            text_box(n.title("MATERIAL BASE:"), vec![text.base_material.clone()]),
            materials_table(
                n.title("MATERIALES UTILIZADOS:"),
                &block.materials,
                &MAGNETIC_MATERIAL_ORDER,
            ),
            text_box(
                n.title("TIPO Y MÉTODO:"),
                vec![
                    format!("Tipo: {}", block.type_and_method.kind),
                    format!("Método: {}", block.type_and_method.method),
                ],
            ),
            Section::Table {
                title: n.title("PARÁMETROS DE OPERACIÓN:"),
                columns: vec![
                    Column::new("ACTIVIDAD", 50.0),
                    Column::new("DISTANCIA", 40.0),
                    Column::new("APLICACIÓN", 45.0),
                    Column::new("ILUMINACIÓN", 50.9),
                ],
                rows: parameter_rows,
                empty_message: "Sin parámetros registrados".to_string(),
            },
            text_box(
                n.title("PROCESO Y CORRIENTE:"),
                vec![
                    format!("Proceso: {}", block.process_and_current.process),
                    format!("Corriente: {}", block.process_and_current.current),
                ],
            ),
            elements_table(n.title("ELEMENTOS INSPECCIONADOS:"), &block.elements, method),
            text_box(
                n.title("DETALLE DE ELEMENTOS INSPECCIONADOS Y RESULTADOS:"),
                text_or(&block.common.detail_results, NO_DETAILS_FALLBACK),
            ),
            text_box(
                n.title("OBSERVACIONES GENERALES:"),
                text_or(&block.common.general_observations, NO_OBSERVATIONS_FALLBACK),
            ),
        ];

        let (left, right) = build_header_fields(&project, &text.welding_processes, MAGNETIC_KIND);

        Ok(ReportData {
            method,
            header: ReportHeader {
                title: MAGNETIC_TITLE.to_string(),
                norm: text.norm,
                left,
                right,
            },
            sections,
            photo_heading: n.title("REGISTROS FOTOGRÁFICOS"),
            photos: block.common.photos,
            scheme: store.scheme()?,
            photo_layout: PhotoLayout::Grouped,
        })
    }
}
