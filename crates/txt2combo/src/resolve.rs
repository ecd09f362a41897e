//! Resolve a selection against a [Document]
//!
//! Resolution never fails. A stale selection falls back to column defaults and an unknown concat reference
//! contributes nothing, so a graph that was saved against an older version of a file keeps running.
use crate::document::{ConcatPart, ConcatTemplate, Document, Layout, Section, ERROR_OUTPUT};
use crate::value::Value;
use serde::ser::SerializeMap;
use std::collections::HashMap;

/// Chosen row key (lookup sections) or raw widget value (widget sections), per section key
pub type Selections = indexmap::IndexMap<String, String>;

/// Values of every resolved column, hidden ones included. Later sections shadow earlier ones.
pub type Context = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Output {
    pub name: String,
    pub value: Value,
}

/// Resolved outputs in slot order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs(pub Vec<Output>);

impl Outputs {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|output| output.name == name)
            .map(|output| &output.value)
    }

    /// Remove the first output named `name`
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.0.iter().position(|output| output.name == name)?;
        Some(self.0.remove(index).value)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|output| &output.value)
    }
}

impl serde::ser::Serialize for Outputs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut ser = serializer.serialize_map(Some(self.0.len()))?;
        for output in &self.0 {
            ser.serialize_entry(&output.name, &output.value)?;
        }
        ser.end()
    }
}

impl Document {
    pub fn resolve(&self, selections: &Selections) -> Outputs {
        match self {
            Document::Parsed(layout) => layout.resolve(selections),
            Document::Invalid { reason } => Outputs(vec![Output::new(
                ERROR_OUTPUT.to_string(),
                Value::String(reason.clone()),
            )]),
        }
    }
}

impl Layout {
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn resolve(&self, selections: &Selections) -> Outputs {
        let mut context = Context::new();
        let mut outputs = vec![];

        for (key, section) in &self.sections {
            let selection = selections.get(key).map(String::as_str);
            let values = section.resolve(selection);

            for (column, value) in section.columns.iter().zip(values) {
                if column.visible {
                    outputs.push(Output::new(column.name.clone(), value.clone()));
                }
                context.insert(column.name.clone(), value);
            }
        }

        for concat in &self.concatenations {
            outputs.push(Output::new(
                concat.name.clone(),
                Value::String(concat.evaluate(&context)),
            ));
        }

        Outputs(outputs)
    }

    /// Selections that pick the first option of every lookup section and the default of every widget
    pub fn default_selections(&self) -> Selections {
        self.sections
            .iter()
            .map(|(key, section)| {
                let selection = match section.options().next() {
                    Some(first) => first.to_string(),
                    None => section.primary().default.to_string(),
                };
                (key.clone(), selection)
            })
            .collect()
    }
}

impl Section {
    /// One value per column, hidden columns included
    pub fn resolve(&self, selection: Option<&str>) -> Vec<Value> {
        if self.is_widget() {
            // only the key column is fed by the widget
            let mut values = vec![self.primary().resolve(selection)];
            values.extend(self.columns[1..].iter().map(|column| column.default.clone()));
            return values;
        }

        let row = selection.and_then(|key| self.find_row(key));
        if row.is_none() {
            tracing::debug!(section = %self.primary().name, ?selection, "no matching row, using defaults");
        }

        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let field = row.and_then(|row| row.get(index)).map(String::as_str);
                column.resolve(field)
            })
            .collect()
    }
}

impl ConcatTemplate {
    /// Join literals and referenced values. Unknown references are skipped.
    pub fn evaluate(&self, context: &Context) -> String {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                ConcatPart::Literal(literal) => text.push_str(literal),
                ConcatPart::Reference(name) => match context.get(name) {
                    Some(value) => text.push_str(&value.to_string()),
                    None => {
                        tracing::debug!(concat = %self.name, reference = %name, "unresolved reference")
                    }
                },
            }
        }
        text
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const RESOLUTIONS: &str = "\
[Resolution]; [Width=int]; [Height=int]; [Ratio=float]
FullHD; 1920; 1080; 1.7778
Square; 1080; 1080
4K; 3840; 2160; 1.7778
";

    fn selections<const N: usize>(pairs: [(&str, &str); N]) -> Selections {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lookup_resolves_full_row() {
        let outputs = Document::parse(RESOLUTIONS).resolve(&selections([("Resolution", "4K")]));
        let values: Vec<_> = outputs.values().cloned().collect();
        assert_eq!(
            values,
            vec![
                Value::from("4K"),
                Value::Integer(3840),
                Value::Integer(2160),
                Value::Decimal(1.7778),
            ]
        );
    }

    #[test]
    fn short_rows_pad_with_defaults() {
        let outputs = Document::parse(RESOLUTIONS).resolve(&selections([("Resolution", "Square")]));
        assert_eq!(outputs.get("Height"), Some(&Value::Integer(1080)));
        assert_eq!(outputs.get("Ratio"), Some(&Value::Decimal(0.0)));
    }

    #[test]
    fn stale_selection_uses_defaults() {
        let document = Document::parse("[Size]; [Steps=int;default=20]\nsmall; 10");
        let outputs = document.resolve(&selections([("Size", "gone")]));
        assert_eq!(outputs.get("Size"), Some(&Value::from("")));
        assert_eq!(outputs.get("Steps"), Some(&Value::Integer(20)));

        let outputs = document.resolve(&Selections::new());
        assert_eq!(outputs.get("Steps"), Some(&Value::Integer(20)));
    }

    #[test]
    fn lookup_is_exact_and_first_match_wins() {
        let document = Document::parse("[Key]; [n=int]\na; 1\nA; 2\na; 3");
        assert_eq!(
            document.resolve(&selections([("Key", "a")])).get("n"),
            Some(&Value::Integer(1))
        );
        assert_eq!(
            document.resolve(&selections([("Key", "A")])).get("n"),
            Some(&Value::Integer(2))
        );
    }

    #[test]
    fn first_row_selection_reproduces_row() {
        let document = Document::parse(RESOLUTIONS);
        let layout = document.layout().unwrap();
        let outputs = layout.resolve(&layout.default_selections());
        assert_eq!(outputs.get("Resolution"), Some(&Value::from("FullHD")));
        assert_eq!(outputs.get("Width"), Some(&Value::Integer(1920)));
        assert_eq!(outputs.get("Height"), Some(&Value::Integer(1080)));
        assert_eq!(outputs.get("Ratio"), Some(&Value::Decimal(1.7778)));
    }

    #[test]
    fn widgets_bypass_row_lookup() {
        let document = Document::parse("[Seed=int]\n[Prompt=textbox]\n[Strength=float;default=0,5]");
        let outputs = document.resolve(&selections([("Seed", "42"), ("Prompt", " a cat ")]));
        assert_eq!(
            outputs.values().cloned().collect::<Vec<_>>(),
            vec![Value::Integer(42), Value::from("a cat"), Value::Decimal(0.5)]
        );
    }

    #[test]
    fn concatenation_uses_hidden_columns() {
        let document = Document::parse(
            "[first;output=false]\n[last;output=false]\n[number=int;output=false]\n\
             [concat=full];[first];\" \";[last];\"_nr\";[number]",
        );
        let outputs = document.resolve(&selections([
            ("first", "John"),
            ("last", "Doe"),
            ("number", "3"),
        ]));
        assert_eq!(
            outputs,
            Outputs(vec![Output::new("full".into(), Value::from("John Doe_nr3"))])
        );
    }

    #[test]
    fn unresolved_references_contribute_nothing() {
        let document = Document::parse("[first]\n[concat=x];\"<\";[missing];[first];\">\"");
        let outputs = document.resolve(&selections([("first", "a")]));
        assert_eq!(outputs.get("x"), Some(&Value::from("<a>")));
    }

    #[test]
    fn one_value_per_section_and_concatenation() {
        let document = Document::parse("[A]\nx\n[B=int]\n[C=bool]\nyes\n[concat=AB];[A];[B]\n[concat=C2];[C]");
        let outputs = document.resolve(&selections([("A", "x"), ("B", "5"), ("C", "yes")]));
        assert_eq!(outputs.len(), 5);
        assert_eq!(outputs.get("AB"), Some(&Value::from("x5")));
        assert_eq!(outputs.get("C2"), Some(&Value::from("true")));
    }

    #[test]
    fn invalid_document_reports_reason() {
        let outputs = Document::parse("").resolve(&Selections::new());
        assert_eq!(outputs.get(ERROR_OUTPUT), Some(&Value::from("File Empty or Invalid")));
    }
}
