//! 浸透探傷（PT）の抽出

use super::{
    elements_table, load_block, text_box, text_or, CommonText, ReportExtractor,
    NO_DETAILS_FALLBACK, NO_OBSERVATIONS_FALLBACK,
};
use crate::error::Result;
use crate::export::pdf_core::build_header_fields;
use crate::report::{Column, PhotoLayout, ReportData, ReportHeader, Section, SectionNumbering};
use crate::store::SessionStore;
use crate::types::{
    ordered_materials, InspectionMethod, MaterialUsed, PenetrantBlock, PENETRANT_DEFAULT_METHOD,
    PENETRANT_DEFAULT_TYPE, PENETRANT_MATERIAL_ORDER,
};
use std::collections::BTreeMap;

pub const PENETRANT_TITLE: &str = "INFORME INSPECCIÓN LÍQUIDOS PENETRANTES";

/// 材料表（DETALLES / FABRICANTE / REFERENCIA / LOTE）
pub(crate) fn materials_table(
    title: String,
    materials: &BTreeMap<String, MaterialUsed>,
    order: &[&str],
) -> Section {
    let rows = ordered_materials(materials, order)
        .into_iter()
        .map(|(detail, m)| {
            vec![
                detail.to_string(),
                m.manufacturer.clone(),
                m.reference.clone(),
                m.lot.clone(),
            ]
        })
        .collect();
    Section::Table {
        title,
        columns: vec![
            Column::new("DETALLES", 45.0),
            Column::new("FABRICANTE", 45.0),
            Column::new("REFERENCIA COMERCIAL", 55.9),
            Column::new("LOTE N°", 40.0),
        ],
        rows,
        empty_message: "Sin materiales registrados".to_string(),
    }
}

pub struct PenetrantExtractor;

impl ReportExtractor for PenetrantExtractor {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Penetrant
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData> {
        let method = self.method();
        let block: PenetrantBlock = load_block(store, method)?;
        let project = store.project_header()?;
        let text = CommonText::new(&block.common, method, &project);
        let penetrant_type = block
            .penetrant_type
            .clone()
            .unwrap_or_else(|| PENETRANT_DEFAULT_TYPE.to_string());
        let penetrant_method = block
            .method
            .clone()
            .unwrap_or_else(|| PENETRANT_DEFAULT_METHOD.to_string());

        let mut type_lines = vec![
            format!("Tipo: {}", penetrant_type),
            format!("Método: {}", penetrant_method),
        ];
        if !block.procedure_steps.trim().is_empty() {
            type_lines.push(String::new());
            type_lines.push("Pasos del Procedimiento:".to_string());
            type_lines.extend(block.procedure_steps.lines().map(String::from));
        }

        let parameter_rows = block
            .parameters
            .iter()
            .map(|p| {
                vec![
                    p.activity.clone(),
                    p.dwell_minutes.to_string(),
                    p.temperature.clone(),
                    p.application.clone(),
                    p.lighting.clone(),
                ]
            })
            .collect();

        let mut n = SectionNumbering::new();
        let sections = vec![
            text_box(
                n.title("NORMAS PARA EL CRITERIO DE EVALUACIÓN:"),
                vec![format!("Norma: {}", text.norm)],
            ),
            text_box(n.title("PROCEDIMIENTO:"), vec![format!("Procedimiento: {}", text.procedure)]),
            text_box(n.title("EQUIPOS UTILIZADOS"), vec![text.equipment.clone()]),
            text_box(n.title("MATERIAL BASE:"), vec![text.base_material.clone()]),
            materials_table(
                n.title("MATERIALES UTILIZADOS:"),
                &block.materials,
                &PENETRANT_MATERIAL_ORDER,
            ),
            text_box(n.title("NORMAS PARA PROCEDIMIENTOS Y MÉTODOS DE APLICACIÓN:"), type_lines),
            Section::Table {
                title: n.title("PARÁMETROS DE OPERACIÓN:"),
                columns: vec![
                    Column::new("ACTIVIDAD", 40.0),
                    Column::new("TIEMPO DE PERMANENCIA (min)", 45.0),
                    Column::new("TEMPERATURA", 30.0),
                    Column::new("APLICACIÓN", 35.0),
                    Column::new("ILUMINACIÓN", 35.9),
                ],
                rows: parameter_rows,
                empty_message: "Sin parámetros registrados".to_string(),
            },
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

        let (left, right) = build_header_fields(&project, &text.welding_processes, &penetrant_type);

        Ok(ReportData {
            method,
            header: ReportHeader {
                title: PENETRANT_TITLE.to_string(),
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
