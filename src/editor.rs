//! セッションストアの編集操作
//!
//! CLIの各サブコマンドから呼ばれる。ブロックは型付きで読み込んで編集し、
//! そのまま書き戻す（保存はmain側で行う）。

use crate::cli::{ElementFields, ProjectFields, ReferenceKind};
use crate::error::{ReportError, Result};
use crate::scanner::{collect_images, load_attachments};
use dialoguer::{Input, Select};
use inspection_report_common::reference::{BASE_MATERIAL_SPECS, WELDING_PROCESSES, WELDING_TYPES};
use inspection_report_common::types::{
    BlockCommon, InspectionBlock, MagneticBlock, PenetrantBlock, UltrasoundBlock, VisualBlock,
};
use inspection_report_common::{
    ElementList, Error as CommonError, InspectedElement, InspectionMethod, PhotoAttachment,
    ProjectHeader, Qualification, ReferenceData, SessionStore, UltrasoundJoint,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ============================================
// ブロック編集
// ============================================

/// ブロックを読み込み（なければ既定値）、編集して書き戻す
fn edit_block<B, R>(store: &mut SessionStore, edit: impl FnOnce(&mut B) -> Result<R>) -> Result<R>
where
    B: InspectionBlock + Serialize + DeserializeOwned + Default,
{
    let key = B::METHOD.block_key();
    let mut block: B = store.block_or_default(key)?;
    let out = edit(&mut block)?;
    store.put_block(key, &block)?;
    Ok(out)
}

fn read_block<B>(store: &SessionStore) -> Result<B>
where
    B: InspectionBlock + DeserializeOwned + Default,
{
    Ok(store.block_or_default(B::METHOD.block_key())?)
}

/// 共通項目（写真など）を編集
fn edit_common<R>(
    store: &mut SessionStore,
    method: InspectionMethod,
    edit: impl FnOnce(&mut BlockCommon) -> Result<R>,
) -> Result<R> {
    match method {
        InspectionMethod::Visual => edit_block(store, |b: &mut VisualBlock| edit(b.common_mut())),
        InspectionMethod::Penetrant => edit_block(store, |b: &mut PenetrantBlock| edit(b.common_mut())),
        InspectionMethod::MagneticParticle => {
            edit_block(store, |b: &mut MagneticBlock| edit(b.common_mut()))
        }
        InspectionMethod::Ultrasound => {
            edit_block(store, |b: &mut UltrasoundBlock| edit(b.common_mut()))
        }
    }
}

fn read_common(store: &SessionStore, method: InspectionMethod) -> Result<BlockCommon> {
    Ok(match method {
        InspectionMethod::Visual => read_block::<VisualBlock>(store)?.common,
        InspectionMethod::Penetrant => read_block::<PenetrantBlock>(store)?.common,
        InspectionMethod::MagneticParticle => read_block::<MagneticBlock>(store)?.common,
        InspectionMethod::Ultrasound => read_block::<UltrasoundBlock>(store)?.common,
    })
}

/// VT/PT/MT の要素リストを編集
fn edit_elements<R>(
    store: &mut SessionStore,
    method: InspectionMethod,
    edit: impl FnOnce(&mut ElementList<InspectedElement>) -> Result<R>,
) -> Result<R> {
    match method {
        InspectionMethod::Visual => edit_block(store, |b: &mut VisualBlock| edit(&mut b.elements)),
        InspectionMethod::Penetrant => edit_block(store, |b: &mut PenetrantBlock| edit(&mut b.elements)),
        InspectionMethod::MagneticParticle => {
            edit_block(store, |b: &mut MagneticBlock| edit(&mut b.elements))
        }
        InspectionMethod::Ultrasound => Err(ReportError::Input(
            "超音波探傷はジョイント行として編集してください".into(),
        )),
    }
}

// ============================================
// プロジェクト情報
// ============================================

/// 指定された項目だけを上書きして保存
pub fn set_project(store: &mut SessionStore, fields: ProjectFields) -> Result<ProjectHeader> {
    let mut header = store.project_header()?;
    let ProjectFields {
        client,
        project,
        sub_project,
        contractor,
        report_number,
        prepared_by,
        norm,
        date,
        place,
        modules,
    } = fields;

    let assign = |target: &mut String, value: Option<String>| {
        if let Some(value) = value {
            *target = value.trim().to_string();
        }
    };
    assign(&mut header.client, client);
    assign(&mut header.project, project);
    assign(&mut header.sub_project, sub_project);
    assign(&mut header.contractor, contractor);
    assign(&mut header.report_number, report_number);
    assign(&mut header.prepared_by, prepared_by);
    assign(&mut header.global_norm, norm);
    assign(&mut header.date, date);
    assign(&mut header.place, place);
    if let Some(mut modules) = modules {
        // 先に指定された順を残して重複を除く
        let mut seen = HashSet::new();
        modules.retain(|m| seen.insert(*m));
        header.selected_modules = modules;
    }

    store.save_project_header(&header)?;
    Ok(header)
}

pub fn describe_project(header: &ProjectHeader) -> Vec<String> {
    let modules: Vec<&str> = header.selected_modules.iter().map(|m| m.display_name()).collect();
    vec![
        format!("Cliente:      {}", header.client),
        format!("Proyecto:     {}", header.project),
        format!("Subproyecto:  {}", header.sub_project),
        format!("Contratista:  {}", header.contractor),
        format!("Reporte N°:   {}", header.report_number),
        format!("Elaboró:      {}", header.prepared_by),
        format!("Norma:        {}", header.global_norm),
        format!("Fecha:        {}", header.date),
        format!("Lugar:        {}", header.place),
        format!("Módulos:      {}", modules.join(", ")),
    ]
}

// ============================================
// ブロック丸ごと
// ============================================

fn normalize_block<B>(value: serde_json::Value, store: &mut SessionStore) -> Result<()>
where
    B: InspectionBlock + Serialize + DeserializeOwned,
{
    let block: B = serde_json::from_value(value)?;
    store.put_block(B::METHOD.block_key(), &block)?;
    Ok(())
}

/// JSONファイルでブロックを置き換える（型で検証してから保存）
pub fn put_block(store: &mut SessionStore, method: InspectionMethod, file: &Path) -> Result<()> {
    if !file.exists() {
        return Err(ReportError::FileNotFound(file.display().to_string()));
    }
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    match method {
        InspectionMethod::Visual => normalize_block::<VisualBlock>(value, store),
        InspectionMethod::Penetrant => normalize_block::<PenetrantBlock>(value, store),
        InspectionMethod::MagneticParticle => normalize_block::<MagneticBlock>(value, store),
        InspectionMethod::Ultrasound => normalize_block::<UltrasoundBlock>(value, store),
    }
}

/// ブロックのJSON（写真データは件数だけにする）
pub fn block_json(store: &SessionStore, method: InspectionMethod) -> Result<String> {
    let mut value = store
        .raw_block(method.block_key())
        .cloned()
        .ok_or_else(|| CommonError::MissingBlock(method.block_key().to_string()))?;
    if let Some(photos) = value
        .get_mut("registros_fotograficos")
        .and_then(|p| p.as_array_mut())
    {
        for photo in photos.iter_mut() {
            if let Some(data) = photo.get_mut("archivo") {
                let size = data.as_str().map(str::len).unwrap_or(0);
                *data = serde_json::Value::String(format!("<base64 {} bytes>", size));
            }
        }
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn remove_block(store: &mut SessionStore, method: InspectionMethod) -> Result<()> {
    store
        .remove(method.block_key())
        .map(|_| ())
        .ok_or_else(|| CommonError::MissingBlock(method.block_key().to_string()).into())
}

// ============================================
// 検査要素
// ============================================

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn qualification(method: InspectionMethod, label: Option<String>) -> Result<String> {
    match label {
        None => Ok(Qualification::default_for(method).label().to_string()),
        Some(label) => Qualification::try_parse_for(method, &label)
            .map(|q| q.label().to_string())
            .ok_or_else(|| {
                let options: Vec<&str> = Qualification::options_for(method).iter().map(|q| q.label()).collect();
                ReportError::Input(format!("判定 '{}' は使えません ({})", label, options.join(" / ")))
            }),
    }
}

fn nth(values: &[String], i: usize) -> String {
    values.get(i).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn joint_from_fields(fields: ElementFields) -> Result<UltrasoundJoint> {
    let evaluation = qualification(InspectionMethod::Ultrasound, fields.qualification)?;
    Ok(UltrasoundJoint {
        number: 0,
        joint_description: text(fields.description),
        joint_number: text(fields.joint_number),
        joint_location: text(fields.location),
        stamp: text(fields.stamp),
        decibels_a: nth(&fields.decibels, 0),
        decibels_b: nth(&fields.decibels, 1),
        decibels_c: nth(&fields.decibels, 2),
        decibels_d: nth(&fields.decibels, 3),
        angular_distance: nth(&fields.discontinuity, 0),
        depth: nth(&fields.discontinuity, 1),
        axis_x: nth(&fields.discontinuity, 2),
        axis_y: nth(&fields.discontinuity, 3),
        evaluation,
    })
}

/// 行を追加して割り当てた番号を返す
pub fn add_element(store: &mut SessionStore, method: InspectionMethod, fields: ElementFields) -> Result<usize> {
    if method == InspectionMethod::Ultrasound {
        let joint = joint_from_fields(fields)?;
        return edit_block(store, |b: &mut UltrasoundBlock| Ok(b.elements.add(joint)));
    }
    let element = InspectedElement {
        number: 0,
        description: text(fields.description),
        indication: text(fields.indication),
        qualification: qualification(method, fields.qualification)?,
        observation: text(fields.observation),
    };
    edit_elements(store, method, |list| Ok(list.add(element)))
}

/// 行を削除（後続は番号が繰り上がる）
pub fn remove_element(store: &mut SessionStore, method: InspectionMethod, number: usize) -> Result<()> {
    if method == InspectionMethod::Ultrasound {
        return edit_block(store, |b: &mut UltrasoundBlock| {
            b.elements.remove(number)?;
            Ok(())
        });
    }
    edit_elements(store, method, |list| {
        list.remove(number)?;
        Ok(())
    })
}

pub fn list_elements(store: &SessionStore, method: InspectionMethod) -> Result<Vec<String>> {
    let lines = match method {
        InspectionMethod::Visual => element_lines(&read_block::<VisualBlock>(store)?.elements),
        InspectionMethod::Penetrant => element_lines(&read_block::<PenetrantBlock>(store)?.elements),
        InspectionMethod::MagneticParticle => element_lines(&read_block::<MagneticBlock>(store)?.elements),
        InspectionMethod::Ultrasound => read_block::<UltrasoundBlock>(store)?
            .elements
            .iter()
            .map(|j| {
                format!(
                    "{:>3}. {} [{}] {} dB:{} -> {}",
                    j.number,
                    j.joint_description,
                    j.joint_number,
                    j.joint_location,
                    j.decibels(),
                    j.evaluation
                )
            })
            .collect(),
    };
    Ok(lines)
}

fn element_lines(list: &ElementList<InspectedElement>) -> Vec<String> {
    list.iter()
        .map(|e| {
            format!(
                "{:>3}. {} | {} | {} | {}",
                e.number, e.description, e.indication, e.qualification, e.observation
            )
        })
        .collect()
}

fn prompt(label: &str, initial: Option<String>) -> Result<Option<String>> {
    let mut input = Input::<String>::new().with_prompt(label).allow_empty(true);
    if let Some(initial) = initial {
        input = input.with_initial_text(initial);
    }
    let value = input
        .interact_text()
        .map_err(|e| ReportError::Input(e.to_string()))?;
    let value = value.trim();
    Ok(if value.is_empty() { None } else { Some(value.to_string()) })
}

fn prompt_list(label: &str) -> Result<Vec<String>> {
    Ok(prompt(label, None)?
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default())
}

/// 対話式で入力項目を埋める（コマンドラインで指定済みの値は初期値になる）
pub fn prompt_element_fields(method: InspectionMethod, given: ElementFields) -> Result<ElementFields> {
    let mut fields = given;
    let is_ut = method == InspectionMethod::Ultrasound;

    fields.description = prompt(if is_ut { "Descripción junta" } else { "Descripción" }, fields.description)?;
    if is_ut {
        fields.joint_number = prompt("N° junta", fields.joint_number)?;
        fields.location = prompt("Ubicación", fields.location)?;
        fields.stamp = prompt("Estampe", fields.stamp)?;
        if fields.decibels.is_empty() {
            fields.decibels = prompt_list("Decibeles A,B,C,D")?;
        }
        if fields.discontinuity.is_empty() {
            fields.discontinuity = prompt_list("Distancia angular,Profundidad,X,Y")?;
        }
    } else {
        fields.indication = prompt("Indicación", fields.indication)?;
    }

    let options = Qualification::options_for(method);
    let labels: Vec<&str> = options.iter().map(|q| q.label()).collect();
    let default = fields
        .qualification
        .as_deref()
        .and_then(|l| Qualification::try_parse_for(method, l))
        .and_then(|q| options.iter().position(|o| *o == q))
        .unwrap_or(0);
    let selected = Select::new()
        .with_prompt(if is_ut { "Evaluación" } else { "Calificación" })
        .items(&labels)
        .default(default)
        .interact()
        .map_err(|e| ReportError::Input(e.to_string()))?;
    fields.qualification = labels.get(selected).map(|l| l.to_string());

    if !is_ut {
        fields.observation = prompt("Observación", fields.observation)?;
    }
    Ok(fields)
}

// ============================================
// 写真・配置図
// ============================================

/// 写真を追加（戻り値: 追加数, スキップしたファイル名）
pub fn add_photos(
    store: &mut SessionStore,
    method: InspectionMethod,
    paths: &[PathBuf],
    caption: Option<&str>,
) -> Result<(usize, Vec<String>)> {
    let images = collect_images(paths)?;
    if images.is_empty() {
        return Err(ReportError::NoImagesFound(
            paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "),
        ));
    }
    edit_common(store, method, |common| {
        let (added, skipped) = load_attachments(&images, caption, &common.photos)?;
        let count = added.len();
        common.photos.extend(added);
        Ok((count, skipped))
    })
}

fn remove_photo_at(photos: &mut Vec<PhotoAttachment>, number: usize) -> Result<PhotoAttachment> {
    if number == 0 || number > photos.len() {
        return Err(CommonError::PhotoNotFound(number).into());
    }
    Ok(photos.remove(number - 1))
}

pub fn remove_photo(store: &mut SessionStore, method: InspectionMethod, number: usize) -> Result<PhotoAttachment> {
    edit_common(store, method, |common| remove_photo_at(&mut common.photos, number))
}

fn photo_lines(photos: &[PhotoAttachment]) -> Vec<String> {
    photos
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let size = p.data.as_ref().map(Vec::len).unwrap_or(0);
            format!("{:>3}. {} ({} KB) {}", i + 1, p.name, size / 1024, p.caption)
        })
        .collect()
}

pub fn list_photos(store: &SessionStore, method: InspectionMethod) -> Result<Vec<String>> {
    Ok(photo_lines(&read_common(store, method)?.photos))
}

pub fn add_scheme(store: &mut SessionStore, paths: &[PathBuf], caption: Option<&str>) -> Result<(usize, Vec<String>)> {
    let images = collect_images(paths)?;
    let mut scheme = store.scheme()?;
    let (added, skipped) = load_attachments(&images, caption, &scheme)?;
    let count = added.len();
    scheme.extend(added);
    store.put_scheme(&scheme)?;
    Ok((count, skipped))
}

pub fn remove_scheme(store: &mut SessionStore, number: usize) -> Result<PhotoAttachment> {
    let mut scheme = store.scheme()?;
    let removed = remove_photo_at(&mut scheme, number)?;
    store.put_scheme(&scheme)?;
    Ok(removed)
}

pub fn list_scheme(store: &SessionStore) -> Result<Vec<String>> {
    Ok(photo_lines(&store.scheme()?))
}

// ============================================
// 参照データ
// ============================================

pub fn reference_lines(
    reference: &ReferenceData,
    kind: ReferenceKind,
    method: Option<InspectionMethod>,
) -> Vec<String> {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    match kind {
        ReferenceKind::Kits => match method {
            Some(method) => reference.kits_for_method(method).iter().map(|k| k.label()).collect(),
            None => reference.kits.iter().map(|k| k.label()).collect(),
        },
        ReferenceKind::Procedures => match method {
            Some(method) => reference.procedures_for_method(method).iter().map(|p| p.label()).collect(),
            None => reference.procedures.iter().map(|p| p.label()).collect(),
        },
        ReferenceKind::Materials => reference
            .materials
            .iter()
            .map(|m| format!("{}: {}", m.kind, m.name))
            .collect(),
        ReferenceKind::Inspectors => reference.inspectors.clone(),
        ReferenceKind::Norms => reference.norms.clone(),
        ReferenceKind::Processes => owned(WELDING_PROCESSES),
        ReferenceKind::Types => owned(WELDING_TYPES),
        ReferenceKind::Specs => owned(BASE_MATERIAL_SPECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fields(description: &str, qualification: Option<&str>) -> ElementFields {
        ElementFields {
            description: Some(description.into()),
            qualification: qualification.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_remove_elements_renumbers() {
        let mut store = SessionStore::new();
        let m = InspectionMethod::Penetrant;
        assert_eq!(add_element(&mut store, m, fields("Viga 1", None)).unwrap(), 1);
        assert_eq!(add_element(&mut store, m, fields("Viga 2", None)).unwrap(), 2);
        assert_eq!(add_element(&mut store, m, fields("Viga 3", None)).unwrap(), 3);

        remove_element(&mut store, m, 1).unwrap();
        let lines = list_elements(&store, m).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1. Viga 2"));
        assert!(lines[1].starts_with("  2. Viga 3"));

        assert!(remove_element(&mut store, m, 5).is_err());
    }

    #[test]
    fn test_qualification_is_validated() {
        let mut store = SessionStore::new();
        let err = add_element(&mut store, InspectionMethod::Visual, fields("Placa", Some("Excelente")));
        assert!(matches!(err, Err(ReportError::Input(_))));
        assert!(!store.contains(InspectionMethod::Visual.block_key()));
    }

    #[test]
    fn test_ultrasound_joint_fields() {
        let mut store = SessionStore::new();
        let f = ElementFields {
            description: Some("Unión viga-columna".into()),
            joint_number: Some("J-01".into()),
            decibels: vec!["45".into(), "47".into()],
            ..Default::default()
        };
        assert_eq!(add_element(&mut store, InspectionMethod::Ultrasound, f).unwrap(), 1);
        let block: UltrasoundBlock = store.block(InspectionMethod::Ultrasound.block_key()).unwrap().unwrap();
        let joint = block.elements.get(1).unwrap();
        assert_eq!(joint.joint_number, "J-01");
        assert_eq!(joint.decibels_b, "47");
        assert_eq!(joint.decibels_c, "");
    }

    #[test]
    fn test_set_project_keeps_unspecified_fields() {
        let mut store = SessionStore::new();
        let header = set_project(
            &mut store,
            ProjectFields {
                client: Some(" Nureon ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(header.client, "Nureon");
        assert_eq!(header.project, ProjectHeader::default().project);
        assert_eq!(store.project_header().unwrap().client, "Nureon");
    }

    #[test]
    fn test_set_project_removes_repeated_modules() {
        let mut store = SessionStore::new();
        let header = set_project(
            &mut store,
            ProjectFields {
                modules: Some(vec![
                    InspectionMethod::Visual,
                    InspectionMethod::Penetrant,
                    InspectionMethod::Visual,
                ]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            header.selected_modules,
            vec![InspectionMethod::Visual, InspectionMethod::Penetrant]
        );
    }

    #[test]
    fn test_set_project_over_legacy_project_block() {
        let mut store = SessionStore::new();
        store
            .put_block("datos_proyecto", &serde_json::json!({"cliente": "Antiguo"}))
            .unwrap();
        set_project(
            &mut store,
            ProjectFields {
                client: Some("Nuevo".into()),
                modules: Some(vec![InspectionMethod::Ultrasound]),
                ..Default::default()
            },
        )
        .unwrap();

        let header = store.project_header().unwrap();
        assert_eq!(header.client, "Nuevo");
        assert_eq!(header.selected_modules, vec![InspectionMethod::Ultrasound]);
    }

    #[test]
    fn test_set_project_rejects_empty_modules() {
        let mut store = SessionStore::new();
        let result = set_project(
            &mut store,
            ProjectFields {
                modules: Some(vec![]),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(ReportError::Common(CommonError::NoModulesSelected))
        ));
    }

    #[test]
    fn test_put_block_normalizes_aliases() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("pt.json");
        std::fs::write(&file, r#"{"material_base": ["ASTM A36"], "elementos_inspeccionados": []}"#).unwrap();

        let mut store = SessionStore::new();
        put_block(&mut store, InspectionMethod::Penetrant, &file).unwrap();
        let json = block_json(&store, InspectionMethod::Penetrant).unwrap();
        assert!(json.contains("materiales_base"));
        assert!(json.contains("ASTM A36"));

        remove_block(&mut store, InspectionMethod::Penetrant).unwrap();
        assert!(block_json(&store, InspectionMethod::Penetrant).is_err());
    }

    #[test]
    fn test_photos_add_remove_and_dedupe() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"one").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"two").unwrap();

        let mut store = SessionStore::new();
        let m = InspectionMethod::MagneticParticle;
        let (added, skipped) = add_photos(&mut store, m, &[dir.path().to_path_buf()], Some("Junta")).unwrap();
        assert_eq!((added, skipped.len()), (2, 0));

        // 同じフォルダをもう一度追加しても重複しない
        let (added, skipped) = add_photos(&mut store, m, &[dir.path().to_path_buf()], None).unwrap();
        assert_eq!((added, skipped.len()), (0, 2));

        let removed = remove_photo(&mut store, m, 1).unwrap();
        assert_eq!(removed.name, "a.jpg");
        assert_eq!(list_photos(&store, m).unwrap().len(), 1);
        assert!(matches!(
            remove_photo(&mut store, m, 9),
            Err(ReportError::Common(CommonError::PhotoNotFound(9)))
        ));
    }

    #[test]
    fn test_scheme_is_shared() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plano.png");
        std::fs::write(&file, b"plan").unwrap();

        let mut store = SessionStore::new();
        add_scheme(&mut store, &[file], Some("Planta")).unwrap();
        assert_eq!(list_scheme(&store).unwrap().len(), 1);
        remove_scheme(&mut store, 1).unwrap();
        assert!(list_scheme(&store).unwrap().is_empty());
    }

    #[test]
    fn test_reference_lines_builtin_lists() {
        let reference = ReferenceData::default();
        let processes = reference_lines(&reference, ReferenceKind::Processes, None);
        assert!(processes.contains(&"SMAW".to_string()));
        let specs = reference_lines(&reference, ReferenceKind::Specs, None);
        assert_eq!(specs.len(), BASE_MATERIAL_SPECS.len());
    }
}
