//! 超音波探傷（UT）の抽出

use super::{
    load_block, text_box, text_or, CommonText, ReportExtractor, NO_DETAILS_FALLBACK,
    NO_ELEMENTS_MESSAGE, NO_OBSERVATIONS_FALLBACK,
};
use crate::elements::UltrasoundJoint;
use crate::error::Result;
use crate::export::pdf_core::build_header_fields;
use crate::report::{Column, PhotoLayout, ReportData, ReportHeader, Section, SectionNumbering};
use crate::store::SessionStore;
use crate::types::{InspectionMethod, Qualification, UltrasoundBlock, NOT_SPECIFIED};

pub const ULTRASOUND_TITLE: &str = "INFORME INSPECCIÓN ULTRASONIDO";
pub const ULTRASOUND_KIND: &str = "IV - Ultrasonido";

fn or_not_specified(value: &Option<String>) -> &str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

fn discontinuity(joint: &UltrasoundJoint) -> String {
    format!(
        "DA {} / P {} / X {} / Y {}",
        joint.angular_distance, joint.depth, joint.axis_x, joint.axis_y
    )
}

fn joints_table(title: String, block: &UltrasoundBlock) -> Section {
    let rows = block
        .elements
        .iter()
        .map(|j| {
            vec![
                j.number.to_string(),
                j.joint_description.clone(),
                j.joint_number.clone(),
                j.joint_location.clone(),
                j.stamp.clone(),
                j.decibels(),
                discontinuity(j),
                Qualification::parse_for(InspectionMethod::Ultrasound, &j.evaluation)
                    .label()
                    .to_string(),
            ]
        })
        .collect();
    Section::Table {
        title,
        columns: vec![
            Column::new("No.", 10.0),
            Column::new("Junta", 34.0),
            Column::new("N° Junta", 18.0),
            Column::new("Ubicación", 28.0),
            Column::new("Estampe", 20.0),
            Column::new("dB A/B/C/D", 25.0),
            Column::new("Discontinuidad", 30.9),
            Column::new("Evaluación", 20.0),
        ],
        rows,
        empty_message: NO_ELEMENTS_MESSAGE.to_string(),
    }
}

pub struct UltrasoundExtractor;

impl ReportExtractor for UltrasoundExtractor {
    fn method(&self) -> InspectionMethod {
        InspectionMethod::Ultrasound
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData> {
        let method = self.method();
        let block: UltrasoundBlock = load_block(store, method)?;
        let project = store.project_header()?;
        let text = CommonText::new(&block.common, method, &project);

        let mut equipment_lines = vec![format!("Equipo: {}", text.equipment), "Palpador:".to_string()];
        match &block.transducer {
            Some(transducer) => equipment_lines.extend(transducer.describe()),
            None => equipment_lines.push(NOT_SPECIFIED.to_string()),
        }

        let welding = if block.welding.trim().is_empty() {
            text.welding_processes.clone()
        } else {
            block.welding.clone()
        };

        let mut joint_lines = vec![
            format!("Cantidad de juntas: {}", block.joints.max(block.elements.len() as u32)),
            format!("Tipo de inspección: {}", or_not_specified(&block.inspection_type)),
            format!("Método: {}", or_not_specified(&block.method)),
            format!("Soldadura: {}", welding),
        ];
        for (label, value) in [
            ("Materiales", &block.materials),
            ("Parámetros de operación", &block.parameters),
        ] {
            if !value.trim().is_empty() {
                joint_lines.push(format!("{}:", label));
                joint_lines.extend(value.lines().map(String::from));
            }
        }

        let mut n = SectionNumbering::new();
        let sections = vec![
            text_box(n.title("PROCEDIMIENTO:"), vec![format!("Procedimiento: {}", text.procedure)]),
            text_box(
                n.title("NORMAS PARA EL CRITERIO DE EVALUACIÓN:"),
                vec![format!("Norma: {}", text.norm)],
            ),
            text_box(n.title("EQUIPOS UTILIZADOS"), equipment_lines),
            text_box(n.title("MATERIAL BASE:"), vec![text.base_material.clone()]),
            text_box(n.title("JUNTAS:"), joint_lines),
            joints_table(n.title("ELEMENTOS INSPECCIONADOS:"), &block),
            text_box(
                n.title("DETALLE DE ELEMENTOS INSPECCIONADOS Y RESULTADOS:"),
                text_or(&block.common.detail_results, NO_DETAILS_FALLBACK),
            ),
            text_box(
                n.title("OBSERVACIONES GENERALES:"),
                text_or(&block.common.general_observations, NO_OBSERVATIONS_FALLBACK),
            ),
        ];

        let (left, right) = build_header_fields(&project, &welding, ULTRASOUND_KIND);

        Ok(ReportData {
            method,
            header: ReportHeader {
                title: ULTRASOUND_TITLE.to_string(),
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
