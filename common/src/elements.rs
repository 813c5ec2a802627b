//! 検査要素の行リスト
//!
//! 行番号は常に位置から決まる（1..=len）。削除すると後続の行を振り直す。

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 番号付きの行
pub trait Numbered {
    fn number(&self) -> usize;
    fn set_number(&mut self, number: usize);
}

/// 番号が位置と同期した行リスト
#[derive(Debug, Clone, PartialEq)]
pub struct ElementList<T> {
    rows: Vec<T>,
}

impl<T> Default for ElementList<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Numbered> ElementList<T> {
    /// 既存の行から作成（番号は振り直す）
    pub fn from_rows(rows: Vec<T>) -> Self {
        let mut list = Self { rows };
        list.renumber();
        list
    }

    /// 末尾に追加し、割り当てた番号を返す
    pub fn add(&mut self, mut row: T) -> usize {
        let number = self.rows.len() + 1;
        row.set_number(number);
        self.rows.push(row);
        number
    }

    /// 番号指定で削除
    pub fn remove(&mut self, number: usize) -> Result<T> {
        if number == 0 || number > self.rows.len() {
            return Err(Error::ElementNotFound(number));
        }
        let removed = self.rows.remove(number - 1);
        self.renumber();
        Ok(removed)
    }

    pub fn get(&self, number: usize) -> Option<&T> {
        number.checked_sub(1).and_then(|i| self.rows.get(i))
    }

    /// 番号は書き換えられないように行の中身だけを編集する
    pub fn update<F: FnOnce(&mut T)>(&mut self, number: usize, edit: F) -> Result<()> {
        let row = number
            .checked_sub(1)
            .and_then(|i| self.rows.get_mut(i))
            .ok_or(Error::ElementNotFound(number))?;
        edit(row);
        row.set_number(number);
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.set_number(i + 1);
        }
    }
}

impl<T> ElementList<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.rows
    }
}

impl<'a, T> IntoIterator for &'a ElementList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<T: Serialize> Serialize for ElementList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Numbered> Deserialize<'de> for ElementList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::from_rows(rows))
    }
}

/// 番号は文字列で保存されていることがある（"1"）
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(text) => text.trim().parse().unwrap_or(0),
    })
}

/// 検査要素（VT/PT/MT）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectedElement {
    #[serde(rename = "numero", deserialize_with = "lenient_number")]
    pub number: usize,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "indicacion")]
    pub indication: String,
    #[serde(rename = "calificacion")]
    pub qualification: String,
    #[serde(rename = "observacion")]
    pub observation: String,
}

impl Numbered for InspectedElement {
    fn number(&self) -> usize {
        self.number
    }

    fn set_number(&mut self, number: usize) {
        self.number = number;
    }
}

/// 超音波探傷の検査ジョイント行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UltrasoundJoint {
    #[serde(rename = "numero", deserialize_with = "lenient_number")]
    pub number: usize,
    #[serde(rename = "descripcion_junta")]
    pub joint_description: String,
    #[serde(rename = "numero_junta")]
    pub joint_number: String,
    #[serde(rename = "ubicacion_junta")]
    pub joint_location: String,
    #[serde(rename = "estampe")]
    pub stamp: String,
    #[serde(rename = "decibeles_a")]
    pub decibels_a: String,
    #[serde(rename = "decibeles_b")]
    pub decibels_b: String,
    #[serde(rename = "decibeles_c")]
    pub decibels_c: String,
    #[serde(rename = "decibeles_d")]
    pub decibels_d: String,
    #[serde(rename = "distancia_angular")]
    pub angular_distance: String,
    #[serde(rename = "profundidad")]
    pub depth: String,
    #[serde(rename = "eje_x")]
    pub axis_x: String,
    #[serde(rename = "eje_y")]
    pub axis_y: String,
    #[serde(rename = "evaluacion_junta")]
    pub evaluation: String,
}

impl UltrasoundJoint {
    /// "A/B/C/D" 形式のデシベル表記
    pub fn decibels(&self) -> String {
        [&self.decibels_a, &self.decibels_b, &self.decibels_c, &self.decibels_d]
            .iter()
            .map(|v| if v.trim().is_empty() { "-" } else { v.trim() })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Numbered for UltrasoundJoint {
    fn number(&self) -> usize {
        self.number
    }

    fn set_number(&mut self, number: usize) {
        self.number = number;
    }
}
