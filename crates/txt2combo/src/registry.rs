//! One node per text resource
//!
//! The [Registry] scans a [Store] and compiles every resource into a [Node]: the parsed document plus a
//! [NodeDescriptor] telling a host which inputs and outputs the node has. Lookups go through the class name table
//! owned by the registry, so a host can never ask for a file that was not registered.
//!
//! Evaluation always re-reads the backing file but answers with the output slots fixed at registration. The document
//! compiled at registration time is only used when that read fails.
use crate::column::ColumnType;
use crate::document::{Document, Section};
use crate::resolve::{Output, Outputs, Selections};
use crate::store::{Store, StoreError};
use crate::value::Value;
use indexmap::IndexMap;

/// Dropdown entry for lookup sections without rows
pub const NO_OPTIONS: &str = "None";

/// Name of the optional input every node accepts
pub const INSPECT_INPUT: &str = "inspect";

/// Type of a connection slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    /// accepts and provides every payload type
    Any,
    String,
    Int,
    Float,
    Boolean,
}

impl SlotType {
    /// Whether an output of type `other` may connect to an input of this type
    pub fn accepts(&self, other: &SlotType) -> bool {
        matches!((self, other), (SlotType::Any, _) | (_, SlotType::Any)) || self == other
    }
}

/// Widget a host renders for one section
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "widget", rename_all = "lowercase")]
pub enum Input {
    Combo { options: Vec<String>, default: String },
    Int { default: i64 },
    Float { default: f64 },
    Boolean { default: bool },
    Text { default: String, multiline: bool },
    /// optional connection, see [INSPECT_INPUT]
    Slot { slot_type: SlotType },
}

impl Input {
    fn for_section(section: &Section) -> Input {
        if !section.is_widget() {
            let mut options: Vec<String> = section.options().map(str::to_string).collect();
            if options.is_empty() {
                options.push(NO_OPTIONS.to_string());
            }
            let default = options[0].clone();
            return Input::Combo { options, default };
        }

        let primary = section.primary();
        match (&primary.default, primary.column_type) {
            (Value::Integer(default), _) => Input::Int { default: *default },
            (Value::Decimal(default), _) => Input::Float { default: *default },
            (Value::Boolean(default), _) => Input::Boolean { default: *default },
            (default, column_type) => Input::Text {
                default: default.to_string(),
                multiline: column_type == ColumnType::Textbox,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OutputSlot {
    pub name: String,
    pub slot_type: SlotType,
    pub value_type: ColumnType,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NodeDescriptor {
    pub required: IndexMap<String, Input>,
    pub optional: IndexMap<String, Input>,
    pub outputs: Vec<OutputSlot>,
}

impl NodeDescriptor {
    pub fn new(document: &Document) -> Self {
        let outputs = document
            .outputs()
            .into_iter()
            .map(|(name, value_type)| OutputSlot {
                name: name.to_string(),
                slot_type: SlotType::Any,
                value_type,
                tooltip: format!("{name} ({value_type})"),
            })
            .collect();

        Self {
            required: Self::inputs(document),
            optional: IndexMap::from([(
                INSPECT_INPUT.to_string(),
                Input::Slot {
                    slot_type: SlotType::Any,
                },
            )]),
            outputs,
        }
    }

    fn inputs(document: &Document) -> IndexMap<String, Input> {
        match document {
            Document::Parsed(layout) => layout
                .sections
                .iter()
                .map(|(key, section)| (key.clone(), Input::for_section(section)))
                .collect(),
            Document::Invalid { reason } => IndexMap::from([(
                crate::document::ERROR_OUTPUT.to_string(),
                Input::Combo {
                    options: vec![reason.clone()],
                    default: reason.clone(),
                },
            )]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub class_name: String,
    pub display_name: String,
    /// file name inside the store
    pub resource: String,
    /// last known good document
    pub document: Document,
    pub descriptor: NodeDescriptor,
}

impl Node {
    pub fn compile(resource: &str, text: &str) -> Self {
        let document = Document::parse(text);
        let descriptor = NodeDescriptor::new(&document);
        let stem = resource
            .strip_suffix(&format!(".{}", crate::store::EXTENSION))
            .unwrap_or(resource);

        Self {
            class_name: class_name(resource),
            display_name: format!("Txt2Combo: {stem}"),
            resource: resource.to_string(),
            document,
            descriptor,
        }
    }
}

/// `Txt2Combo_` followed by the file name with `.` and space replaced by `_`
pub fn class_name(resource: &str) -> String {
    format!("Txt2Combo_{}", resource.replace(['.', ' '], "_"))
}

#[derive(Debug)]
pub struct Registry {
    store: Store,
    nodes: IndexMap<String, Node>,
}

impl Registry {
    /// Scan `store` and compile every resource
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let mut registry = Self {
            store,
            nodes: IndexMap::new(),
        };
        registry.reload()?;
        Ok(registry)
    }

    /// Rebuild all nodes from disk
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let mut nodes = IndexMap::new();

        for resource in self.store.list()? {
            let text = match self.store.read(&resource) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(resource = %resource, %error, "skipping unreadable resource");
                    continue;
                }
            };

            let node = Node::compile(&resource, &text);
            tracing::debug!(class_name = %node.class_name, resource = %resource, "node registered");
            nodes.insert(node.class_name.clone(), node);
        }

        tracing::info!(count = nodes.len(), "registry loaded");
        self.nodes = nodes;
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn get(&self, class_name: &str) -> Option<&Node> {
        self.nodes.get(class_name)
    }

    /// File name and current text of a registered node
    pub fn source(&self, class_name: &str) -> Option<Result<(String, String), StoreError>> {
        let node = self.get(class_name)?;
        Some(
            self.store
                .read(&node.resource)
                .map(|text| (node.resource.clone(), text)),
        )
    }

    /// Inputs from the current file content, so dropdowns follow edits without a reload
    pub fn inputs(&self, class_name: &str) -> Option<IndexMap<String, Input>> {
        let document = self.current_document(self.get(class_name)?);
        Some(NodeDescriptor::inputs(&document))
    }

    /// Resolve `selections` against the current file content
    ///
    /// The result always matches the output slots fixed at registration, one value per slot in slot order. Outputs
    /// the file gained since then are dropped until a [Registry::reload], slots it lost get the zero value of their
    /// type.
    pub fn evaluate(&self, class_name: &str, selections: &Selections) -> Option<Outputs> {
        let node = self.get(class_name)?;
        let mut resolved = self.current_document(node).resolve(selections);

        let outputs = node
            .descriptor
            .outputs
            .iter()
            .map(|slot| {
                let value = match resolved.take(&slot.name) {
                    Some(value) => value,
                    None => {
                        tracing::debug!(class_name, slot = %slot.name, "output missing, using zero value");
                        slot.value_type.zero_value()
                    }
                };
                Output::new(slot.name.clone(), value)
            })
            .collect();

        Some(Outputs(outputs))
    }

    fn current_document(&self, node: &Node) -> Document {
        match self.store.read(&node.resource) {
            Ok(text) => Document::parse(&text),
            Err(error) => {
                tracing::warn!(resource = %node.resource, %error, "read failed, using last known good document");
                node.document.clone()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn class_names() {
        assert_eq!(class_name("my list.txt"), "Txt2Combo_my_list_txt");
    }

    #[test]
    fn any_accepts_everything() {
        assert!(SlotType::Any.accepts(&SlotType::Int));
        assert!(SlotType::Float.accepts(&SlotType::Any));
        assert!(SlotType::Int.accepts(&SlotType::Int));
        assert!(!SlotType::Int.accepts(&SlotType::String));
    }

    #[test]
    fn descriptor_for_sections() {
        let node = Node::compile(
            "settings.txt",
            "[Format]\nPNG\nJPG\n[Seed=int;default=7]\n[Prompt=textbox]\n[Name;output=false]\n\
             [Strength=float]\n[On=bool]\n[concat=label];[Format];[Name]",
        );

        assert_eq!(node.display_name, "Txt2Combo: settings");
        assert_eq!(
            node.descriptor.required["Format"],
            Input::Combo {
                options: vec!["PNG".into(), "JPG".into()],
                default: "PNG".into()
            }
        );
        assert_eq!(node.descriptor.required["Seed"], Input::Int { default: 7 });
        assert_eq!(
            node.descriptor.required["Prompt"],
            Input::Text {
                default: String::new(),
                multiline: true
            }
        );
        assert_eq!(
            node.descriptor.required["Name"],
            Input::Text {
                default: String::new(),
                multiline: false
            }
        );
        assert_eq!(node.descriptor.required["Strength"], Input::Float { default: 0.0 });
        assert_eq!(node.descriptor.required["On"], Input::Boolean { default: false });

        let tooltips: Vec<_> = node
            .descriptor
            .outputs
            .iter()
            .map(|output| output.tooltip.as_str())
            .collect();
        assert_eq!(
            tooltips,
            vec![
                "Format (STRING)",
                "Seed (INT)",
                "Prompt (TEXTBOX)",
                "Strength (FLOAT)",
                "On (BOOLEAN)",
                "label (STRING)",
            ]
        );
        assert!(node
            .descriptor
            .outputs
            .iter()
            .all(|output| output.slot_type == SlotType::Any));
    }

    #[test]
    fn invalid_document_descriptor() {
        let node = Node::compile("empty.txt", "# nothing here");
        assert_eq!(node.descriptor.outputs.len(), 1);
        assert_eq!(node.descriptor.outputs[0].name, "Error");
        assert!(matches!(
            node.descriptor.required["Error"],
            Input::Combo { .. }
        ));
    }
}
