//! Vega-Lite chart specifications.
//!
//! Only the subset of the grammar used by the rank and sample plots is
//! modelled. Datasets are kept in insertion order so that serialized output
//! is reproducible.

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Vega-Lite schema the specifications are written against.
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v3.4.0.json";

/// Default view size, matching the usual Vega-Lite embedding defaults.
const VIEW_WIDTH: u32 = 400;
const VIEW_HEIGHT: u32 = 300;

/// Hex digits of the content hash used in primary dataset names.
const DATA_NAME_HASH_LEN: usize = 32;

/// Mark type of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Circle,
}

/// Measurement type of an encoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Nominal,
}

/// Explicit mapping of data values to visual values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub domain: Vec<String>,
    pub range: Vec<String>,
}

/// A field encoded on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
}

impl FieldDef {
    pub fn new(field: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            field_type,
            title: None,
            scale: None,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// A constant channel value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueDef {
    pub value: f64,
}

/// Channel encodings of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ValueDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tooltip: Vec<FieldDef>,
}

/// An interval selection bound to the chart scales (pan and zoom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "type")]
    pub selection_type: String,
    pub bind: String,
    pub encodings: Vec<String>,
}

impl Selection {
    pub fn scale_bound_interval() -> Self {
        Self {
            selection_type: "interval".to_string(),
            bind: "scales".to_string(),
            encodings: vec!["x".to_string(), "y".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(rename = "gridOpacity")]
    pub grid_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub view: ViewConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<AxisConfig>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig {
                width: VIEW_WIDTH,
                height: VIEW_HEIGHT,
            },
            axis: None,
        }
    }
}

/// Reference to a dataset by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedData {
    pub name: String,
}

/// A Vega-Lite chart with inline named datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub title: String,
    pub config: ChartConfig,
    pub data: NamedData,
    pub mark: Mark,
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub selection: IndexMap<String, Selection>,
    pub datasets: IndexMap<String, Value>,
}

/// Name for a primary dataset derived from its serialized content.
pub fn data_name(records: &Value) -> Result<String> {
    let bytes = serde_json::to_vec(records)?;
    let digest = hex::encode(Sha256::digest(&bytes));
    Ok(format!("data-{}", &digest[..DATA_NAME_HASH_LEN]))
}

impl ChartSpec {
    /// Create a chart drawing `records` as its primary dataset.
    pub fn new(title: &str, mark: Mark, records: Vec<Value>) -> Result<Self> {
        let records = Value::Array(records);
        let name = data_name(&records)?;
        let mut datasets = IndexMap::new();
        datasets.insert(name.clone(), records);
        Ok(Self {
            schema: VEGA_LITE_SCHEMA.to_string(),
            title: title.to_string(),
            config: ChartConfig::default(),
            data: NamedData { name },
            mark,
            encoding: Encoding::default(),
            selection: IndexMap::new(),
            datasets,
        })
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn grid_opacity(mut self, opacity: f64) -> Self {
        self.config.axis = Some(AxisConfig {
            grid_opacity: opacity,
        });
        self
    }

    pub fn selection(mut self, name: &str, selection: Selection) -> Self {
        self.selection.insert(name.to_string(), selection);
        self
    }

    /// Attach an auxiliary dataset that is not encoded visually.
    pub fn dataset(mut self, name: &str, value: Value) -> Self {
        self.datasets.insert(name.to_string(), value);
        self
    }

    /// The records drawn by the chart.
    pub fn records(&self) -> &[Value] {
        match self.datasets.get(&self.data.name) {
            Some(Value::Array(records)) => records,
            _ => &[],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
