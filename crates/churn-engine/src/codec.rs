//! Wire contract for scoring requests and responses.
//!
//! Requests arrive as nested columnar tables (`fields` + positional `values`).
//! [`decode`] turns the first table into a row-oriented [`Frame`] for the
//! predictor, [`predict_table`] runs the predictor and checks its output
//! shape, and [`encode`] appends the `prediction` and `probability` columns
//! back onto the original rows.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::predictor::{PredictionError, Predictor};
use crate::validation::ValidationError;

/// Class names in the order the predictor reports probabilities.
pub const LABELS: [&str; 2] = ["No", "Yes"];

/// Name of the appended predicted-label column.
pub const PREDICTION_FIELD: &str = "prediction";

/// Name of the appended probability-vector column.
pub const PROBABILITY_FIELD: &str = "probability";

/// Map a predicted class index to its label.
pub fn label_for(class: usize) -> Option<&'static str> {
    LABELS.get(class).copied()
}

/// A single cell value.
///
/// Deserialization canonicalizes boxed numerics: a one-element array holding
/// a number becomes the bare number. Any other array or object is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl TryFrom<Value> for Scalar {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Bool(b)),
            Value::Number(n) => Ok(Scalar::Number(n)),
            Value::String(s) => Ok(Scalar::String(s)),
            Value::Array(items) => match <[Value; 1]>::try_from(items) {
                Ok([Value::Number(n)]) => Ok(Scalar::Number(n)),
                _ => Err("expected a scalar value, found an array".to_string()),
            },
            Value::Object(_) => Err("expected a scalar value, found an object".to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Scalar::try_from(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

impl Scalar {
    /// Numeric view of the value. Booleans count as 0 and 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Null | Scalar::String(_) => None,
        }
    }

    /// String form used to look up categorical levels. `None` for null.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::String(s) => Some(s.clone()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Number(v.into())
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    pub fields: Vec<String>,
    pub values: Vec<Vec<Scalar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub input_data: Vec<ScoringTable>,
}

/// One output row: the original values followed by the predicted label and
/// the probability vector. Serializes as a flat JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub values: Vec<Scalar>,
    pub prediction: &'static str,
    pub probability: Vec<f64>,
}

impl Serialize for PredictionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len() + 2))?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.serialize_element(self.prediction)?;
        seq.serialize_element(&self.probability)?;
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionTable {
    pub fields: Vec<String>,
    pub labels: [&'static str; 2],
    pub values: Vec<PredictionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringResponse {
    pub predictions: Vec<PredictionTable>,
}

/// Row-oriented table handed to the predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    fields: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Frame {
    /// Build a frame, checking that every row is as wide as `fields`.
    pub fn new(fields: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, Vec<ValidationError>> {
        let errors: Vec<ValidationError> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.len() != fields.len())
            .map(|(i, row)| {
                ValidationError::new(
                    vec![
                        Value::from("body"),
                        Value::from("input_data"),
                        Value::from(0),
                        Value::from("values"),
                        Value::from(i),
                    ],
                    format!(
                        "Row has {} values but {} fields were given",
                        row.len(),
                        fields.len()
                    ),
                    "value_error",
                )
            })
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { fields, rows })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column. Duplicate names resolve to the first match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Values of a named column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Scalar> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Scalar>>) {
        (self.fields, self.rows)
    }
}

/// Select the first table of a request and reshape it into a [`Frame`].
///
/// Tables after the first are ignored; a warning is logged when any are
/// present.
pub fn decode(request: ScoringRequest) -> Result<Frame, Vec<ValidationError>> {
    let mut tables = request.input_data.into_iter();
    let Some(table) = tables.next() else {
        return Err(vec![ValidationError::new(
            vec![Value::from("body"), Value::from("input_data")],
            "List should have at least 1 item after validation, not 0",
            "too_short",
        )]);
    };

    let ignored = tables.len();
    if ignored > 0 {
        tracing::warn!(
            ignored,
            "Scoring request has extra input_data tables; only the first is scored"
        );
    }

    Frame::new(table.fields, table.values)
}

/// Per-row predictor output, checked against the frame's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub labels: Vec<&'static str>,
    pub probabilities: Vec<Vec<f64>>,
}

/// Run the predictor over a frame and map class indices to labels.
pub fn predict_table(
    predictor: &dyn Predictor,
    frame: &Frame,
) -> Result<Predictions, PredictionError> {
    let classes = predictor.predict(frame)?;
    let probabilities = predictor.predict_proba(frame)?;

    if classes.len() != frame.len() {
        return Err(PredictionError::RowCountMismatch {
            what: "labels",
            got: classes.len(),
            expected: frame.len(),
        });
    }
    if probabilities.len() != frame.len() {
        return Err(PredictionError::RowCountMismatch {
            what: "probability vectors",
            got: probabilities.len(),
            expected: frame.len(),
        });
    }

    let labels = classes
        .iter()
        .enumerate()
        .map(|(row, &class)| label_for(class).ok_or(PredictionError::UnknownClass { row, class }))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some((row, probs)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| p.len() != LABELS.len())
    {
        return Err(PredictionError::ProbabilityWidth {
            row,
            got: probs.len(),
            expected: LABELS.len(),
        });
    }

    Ok(Predictions {
        labels,
        probabilities,
    })
}

/// Append predictions to the original rows.
///
/// The output fields are the input fields followed by `prediction` and
/// `probability`, even if the input already uses those names.
pub fn encode(frame: Frame, predictions: Predictions) -> PredictionTable {
    let (mut fields, rows) = frame.into_parts();
    fields.push(PREDICTION_FIELD.to_string());
    fields.push(PROBABILITY_FIELD.to_string());

    let values = rows
        .into_iter()
        .zip(predictions.labels)
        .zip(predictions.probabilities)
        .map(|((values, prediction), probability)| PredictionRow {
            values,
            prediction,
            probability,
        })
        .collect();

    PredictionTable {
        fields,
        labels: LABELS,
        values,
    }
}
