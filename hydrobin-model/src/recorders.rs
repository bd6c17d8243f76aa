//! Recorders expose the results of a simulation run.
//!
//! [`MetaRecorder`] gathers the values of all other
//! recorders into serialisable [`RecorderRecord`]s.
use serde::{Deserialize, Serialize};

/// Kind of a recorder, as recorded in archives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderKind {
    Flow,
    Storage,
    Deficit,
    Aggregated,
    /// A recorder of other recorders. Skipped by [`MetaRecorder`].
    Meta,
    Custom(String),
}

/// An interface for simulation result recorders.
pub trait Recorder {
    fn name(&self) -> &str;

    fn kind(&self) -> RecorderKind;

    /// Name of the recorded node, if the recorder is attached to one.
    fn node(&self) -> Option<&str> {
        None
    }

    /// The recorder's value aggregated over time and scenarios,
    /// if it supports aggregation.
    fn aggregated_value(&self) -> Option<f64> {
        None
    }

    /// The recorder's per-scenario values, if it exposes them.
    fn all_values(&self) -> Option<Vec<f64>> {
        None
    }
}

/// How a [`SeriesRecorder`] aggregates its values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregation {
    /// Aggregates `values`. Returns `None` if `values` is empty.
    ///
    /// # Examples
    /// ```
    /// use hydrobin_model::recorders::Aggregation;
    ///
    /// assert_eq!(Aggregation::Mean.apply(&[1.0, 2.0, 6.0]), Some(3.0));
    /// assert_eq!(Aggregation::Max.apply(&[]), None);
    /// ```
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let it = values.iter().copied();
        Some(match self {
            Aggregation::Sum => it.sum(),
            Aggregation::Mean => it.sum::<f64>() / values.len() as f64,
            Aggregation::Min => it.fold(f64::INFINITY, f64::min),
            Aggregation::Max => it.fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// A recorder holding one value per scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecorder {
    pub name: String,
    pub kind: RecorderKind,
    pub node: Option<String>,
    pub aggregation: Aggregation,
    pub values: Vec<f64>,
}

impl SeriesRecorder {
    pub fn new(name: impl Into<String>, kind: RecorderKind, aggregation: Aggregation) -> SeriesRecorder {
        SeriesRecorder {
            name: name.into(),
            kind,
            node: None,
            aggregation,
            values: vec![],
        }
    }

    /// Attaches the recorder to a node.
    pub fn on_node(mut self, node: impl Into<String>) -> SeriesRecorder {
        self.node = Some(node.into());
        self
    }
}

impl Recorder for SeriesRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RecorderKind {
        self.kind.clone()
    }

    fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    fn aggregated_value(&self) -> Option<f64> {
        self.aggregation.apply(&self.values)
    }

    fn all_values(&self) -> Option<Vec<f64>> {
        Some(self.values.clone())
    }
}

/// The values of one recorder after a run.
///
/// Fields are declared in alphabetical order so
/// that serialised records have sorted keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecorderRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub all_values: Option<Vec<f64>>,
    pub kind: RecorderKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<f64>,
}

impl RecorderRecord {
    fn of(recorder: &dyn Recorder) -> RecorderRecord {
        RecorderRecord {
            all_values: recorder.all_values(),
            kind: recorder.kind(),
            name: recorder.name().to_string(),
            node: recorder.node().map(String::from),
            value: recorder.aggregated_value(),
        }
    }
}

/// A recorder collecting the values of other recorders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaRecorder {
    name: String,
    recorders: Option<Vec<String>>,
}

impl MetaRecorder {
    /// Returns a meta recorder collecting every recorder.
    pub fn new(name: impl Into<String>) -> MetaRecorder {
        MetaRecorder {
            name: name.into(),
            recorders: None,
        }
    }

    /// Returns a meta recorder collecting only the named
    /// recorders, in the given order.
    pub fn with_recorders<S: Into<String>>(
        name: impl Into<String>,
        recorders: impl IntoIterator<Item = S>,
    ) -> MetaRecorder {
        MetaRecorder {
            name: name.into(),
            recorders: Some(recorders.into_iter().map(Into::into).collect()),
        }
    }

    /// Collects one record per recorder. Meta recorders are
    /// skipped, and so are selected names matching no recorder.
    ///
    /// # Examples
    /// ```
    /// use hydrobin_model::recorders::{Aggregation, MetaRecorder, Recorder, RecorderKind, SeriesRecorder};
    ///
    /// let mut deficit = SeriesRecorder::new("deficit", RecorderKind::Deficit, Aggregation::Sum);
    /// deficit.values = vec![1.0, 2.0];
    /// let meta = MetaRecorder::new("meta");
    ///
    /// let records = meta.value(&[&deficit as &dyn Recorder, &meta]);
    ///
    /// assert_eq!(records.len(), 1);
    /// assert_eq!(records[0].value, Some(3.0));
    /// ```
    pub fn value(&self, recorders: &[&dyn Recorder]) -> Vec<RecorderRecord> {
        let collected = recorders
            .iter()
            .filter(|r| r.kind() != RecorderKind::Meta);
        match &self.recorders {
            None => collected.map(|r| RecorderRecord::of(*r)).collect(),
            Some(names) => {
                let collected: Vec<&&dyn Recorder> = collected.collect();
                names
                    .iter()
                    .filter_map(|n| collected.iter().find(|r| r.name() == n))
                    .map(|r| RecorderRecord::of(**r))
                    .collect()
            }
        }
    }

    /// Returns the records of [`value`] as pretty-printed JSON.
    ///
    /// [`value`]: MetaRecorder::value
    pub fn to_json(&self, recorders: &[&dyn Recorder]) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.value(recorders))
    }
}

impl Recorder for MetaRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RecorderKind {
        RecorderKind::Meta
    }
}
