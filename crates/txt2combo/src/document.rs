//! Document model and the line oriented parser
use crate::column::{ColumnDef, ColumnType};
use crate::util::{
    concat_name, is_bracketed, is_comment_or_blank, split_respecting_brackets, split_row,
    strip_brackets, unquote, DELIMITER,
};
use indexmap::IndexMap;

/// Section created for files that contain rows but no header at all
pub const FALLBACK_SECTION: &str = "text";

/// Name of the single output exposed by an [Document::Invalid] document
pub const ERROR_OUTPUT: &str = "Error";

/// A parsed text resource
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Document {
    Parsed(Layout),
    /// Nothing usable was found. Kept apart from [Layout] so an empty file is never mistaken for data.
    Invalid { reason: String },
}

/// Sections and concatenations in source order
///
/// The order is the output slot order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Layout {
    pub sections: IndexMap<String, Section>,
    pub concatenations: Vec<ConcatTemplate>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, derive_new::new)]
pub struct Section {
    /// first column is the key column
    pub columns: Vec<ColumnDef>,
    #[new(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, derive_new::new)]
pub struct ConcatTemplate {
    pub name: String,
    pub parts: Vec<ConcatPart>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatPart {
    /// `"text"`, without the quotes
    Literal(String),
    /// `[Column]`, without the brackets
    Reference(String),
}

impl ConcatPart {
    /// `None` for tokens that are neither quoted nor bracketed
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(text) = unquote(token) {
            return Some(ConcatPart::Literal(text.to_string()));
        }

        if is_bracketed(token) {
            return Some(ConcatPart::Reference(strip_brackets(token).trim().to_string()));
        }

        None
    }
}

impl Section {
    /// The key column. A section always has at least one column.
    pub fn primary(&self) -> &ColumnDef {
        &self.columns[0]
    }

    /// Sections without rows are plain input widgets
    pub fn is_widget(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dropdown entries, the first field of every row
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|row| row.first().map(String::as_str))
    }

    /// First row whose key equals `key` exactly
    pub fn find_row(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|first| first == key))
            .map(Vec::as_slice)
    }
}

impl Layout {
    /// Name and type of every output slot: visible columns first, then concatenations
    pub fn outputs(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        let columns = self
            .sections
            .values()
            .flat_map(|section| &section.columns)
            .filter(|column| column.visible)
            .map(|column| (column.name.as_str(), column.column_type));

        let concatenations = self
            .concatenations
            .iter()
            .map(|concat| (concat.name.as_str(), ColumnType::String));

        columns.chain(concatenations)
    }

    fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.concatenations.is_empty()
    }
}

impl Document {
    /// Parse a text resource. Never fails, malformed lines are absorbed.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn parse(text: &str) -> Document {
        let mut parser = Parser::default();
        for line in text.lines() {
            parser.line(line.trim());
        }

        if parser.layout.is_empty() {
            return Document::Invalid {
                reason: "File Empty or Invalid".to_string(),
            };
        }

        Document::Parsed(parser.layout)
    }

    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Document::Parsed(layout) => Some(layout),
            Document::Invalid { .. } => None,
        }
    }

    /// Output slot names and types
    pub fn outputs(&self) -> Vec<(&str, ColumnType)> {
        match self {
            Document::Parsed(layout) => layout.outputs().collect(),
            Document::Invalid { .. } => vec![(ERROR_OUTPUT, ColumnType::String)],
        }
    }
}

#[derive(Default)]
struct Parser {
    layout: Layout,
    /// target of data rows
    current: Option<String>,
}

impl Parser {
    fn line(&mut self, line: &str) {
        if is_comment_or_blank(line) {
            return;
        }

        if line.starts_with('[') && self.header(line) {
            return;
        }

        self.row(line);
    }

    /// Returns false when the line is not a header after all
    fn header(&mut self, line: &str) -> bool {
        let tokens = split_respecting_brackets(line, DELIMITER);
        let Some(first) = tokens.first() else {
            return false;
        };

        if let Some(name) = concat_name(first) {
            let parts = tokens[1..]
                .iter()
                .filter_map(|token| {
                    let part = ConcatPart::parse(token);
                    if part.is_none() {
                        tracing::debug!(concat = name, token, "dropping invalid concat part");
                    }
                    part
                })
                .collect();

            tracing::trace!(name, "concatenation");
            self.layout
                .concatenations
                .push(ConcatTemplate::new(name.to_string(), parts));
            self.current = None;
            return true;
        }

        if !is_bracketed(first) {
            return false;
        }

        let columns: Vec<ColumnDef> = tokens.iter().map(|token| ColumnDef::parse(token)).collect();
        let key = columns[0].name.clone();
        tracing::trace!(section = %key, columns = columns.len(), "section");

        if self.layout.sections.contains_key(&key) {
            tracing::debug!(section = %key, "section redefined, later definition wins");
        }
        self.layout.sections.insert(key.clone(), Section::new(columns));
        self.current = Some(key);
        true
    }

    fn row(&mut self, line: &str) {
        if self.current.is_none() && self.layout.is_empty() {
            tracing::trace!("no header found, using fallback section");
            let column = ColumnDef::new(FALLBACK_SECTION, ColumnType::String);
            self.layout
                .sections
                .insert(FALLBACK_SECTION.to_string(), Section::new(vec![column]));
            self.current = Some(FALLBACK_SECTION.to_string());
        }

        let Some(section) = self
            .current
            .as_ref()
            .and_then(|key| self.layout.sections.get_mut(key))
        else {
            tracing::debug!(line, "row outside of a section");
            return;
        };

        section.rows.push(split_row(line));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn layout(text: &str) -> Layout {
        match Document::parse(text) {
            Document::Parsed(layout) => layout,
            Document::Invalid { reason } => panic!("expected a parsed document: {reason}"),
        }
    }

    #[test]
    fn sections_in_order() {
        let layout = layout(
            "# comment\n\
             [Resolution]; [Width=int]; [Height=int]; [Ratio=float]\n\
             FullHD; 1920; 1080; 1.7778\n\
             \n\
             [Format]\n\
             PNG\n\
             JPG\n",
        );

        let keys: Vec<_> = layout.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Resolution", "Format"]);

        let resolution = &layout.sections["Resolution"];
        assert_eq!(resolution.columns.len(), 4);
        assert_eq!(resolution.columns[3].column_type, ColumnType::Float);
        assert_eq!(resolution.rows, vec![vec!["FullHD", "1920", "1080", "1.7778"]]);

        let options: Vec<_> = layout.sections["Format"].options().collect();
        assert_eq!(options, vec!["PNG", "JPG"]);
    }

    #[test]
    fn attributes_stay_inside_their_column() {
        let layout = layout("[firstname=string;output=false]; [Age=int;default=7]");
        let columns = &layout.sections["firstname"].columns;
        assert_eq!(columns.len(), 2);
        assert!(!columns[0].visible);
        assert_eq!(columns[1].default, Value::Integer(7));
        assert!(layout.sections["firstname"].is_widget());
    }

    #[test]
    fn concatenation() {
        let layout = layout("[first]\n[last]\n[concat=full];[first];\" \";[last];oops");
        assert_eq!(
            layout.concatenations,
            vec![ConcatTemplate::new(
                "full".into(),
                vec![
                    ConcatPart::Reference("first".into()),
                    ConcatPart::Literal(" ".into()),
                    ConcatPart::Reference("last".into()),
                ]
            )]
        );
    }

    #[test]
    fn rows_after_concatenation_are_dropped() {
        let layout = layout("[Format]\nPNG\n[concat=x];[Format]\nJPG");
        assert_eq!(layout.sections["Format"].rows.len(), 1);
    }

    #[test]
    fn plain_list_uses_fallback_section() {
        let layout = layout("apple\nbanana; yellow\n");
        let section = &layout.sections[FALLBACK_SECTION];
        assert_eq!(section.columns, vec![ColumnDef::new("text", ColumnType::String)]);
        assert_eq!(section.options().collect::<Vec<_>>(), vec!["apple", "banana"]);
    }

    #[test]
    fn unterminated_header_is_a_row() {
        let layout = layout("[Format]\n[not a header; x");
        assert_eq!(layout.sections["Format"].rows, vec![vec!["[not a header", "x"]]);
    }

    #[test]
    fn redefined_section_replaces_in_place() {
        let layout = layout("[A]\n1\n[B]\n2\n[A=int]\n3");
        let keys: Vec<_> = layout.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(layout.sections["A"].rows, vec![vec!["3"]]);
        assert_eq!(layout.sections["A"].primary().column_type, ColumnType::Int);
    }

    #[test]
    fn empty_documents_are_invalid() {
        assert!(matches!(Document::parse(""), Document::Invalid { .. }));
        assert!(matches!(
            Document::parse("# only comments\n\n#"),
            Document::Invalid { .. }
        ));
        assert_eq!(
            Document::parse("").outputs(),
            vec![(ERROR_OUTPUT, ColumnType::String)]
        );
    }

    #[test]
    fn outputs_skip_hidden_columns() {
        let document = Document::parse(
            "[Size]; [Width=int;output=no]; [Ratio=float]\n[n=int;output=false]\n[concat=label];[Size]",
        );
        assert_eq!(
            document.outputs(),
            vec![
                ("Size", ColumnType::String),
                ("Ratio", ColumnType::Float),
                ("label", ColumnType::String),
            ]
        );
    }
}
