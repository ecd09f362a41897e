//! # txt2combo - text defined lookup tables
//!
//! Turns small text files into node definitions for a node graph editor: every section of a file becomes a dropdown
//! (or an input field) and every column becomes an output.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `txt2combo` works internally.
//!
//! ### The text format
//!
//! The format is line oriented:
//! - blank lines and lines starting with `#` are ignored
//! - a line starting with `[` is a header
//!   - `[concat=Name];[Ref];"literal";...` defines a concatenation
//!   - anything else starts a section, every `;` separated token is one column
//! - any other line is a data row of the current section, fields are `;` separated
//!
//! A column is `Name`, `Name=type` or `Name=type;attribute=value;...`. Types are `string` (default), `int`, `float`,
//! `bool` and `textbox`. Attributes are `output` (`output=false` hides the column) and `default`.
//!
//! ```text
//! # lookup table, the first column is the dropdown
//! [Resolution]; [Width=int]; [Height=int]; [Ratio=float]
//! FullHD; 1920; 1080; 1.7778
//! 4K; 3840; 2160; 1.7778
//!
//! # no rows: an input field
//! [firstname=string;output=false]
//! [lastname=string;output=false]
//!
//! [concat=fullname];[firstname];" ";[lastname]
//! ```
//!
//! ### Parsing
//!
//! see [document::Document::parse]
//!
//! Parsing never fails. Header lines are split with [util::split_respecting_brackets] so that the `;` inside
//! `[Width=int;output=false]` stays part of its column, and every token is read by [column::ColumnDef::parse].
//! Unknown types and attributes are accepted silently. A file without any usable line becomes
//! [document::Document::Invalid].
//!
//! ### Validation
//!
//! see [validate::validate]
//!
//! The strict counterpart of parsing, run before anything is written. It reports every problem with its line number.
//!
//! ### Resolution
//!
//! see [document::Layout::resolve]
//!
//! Given one selection per section (a row key, or the raw value of an input field) every column is converted with
//! [value::Value::convert]. Concatenations are evaluated last, against the values of all section columns, including
//! hidden ones.
//!
//! ### Storage and registry
//!
//! [store::Store] reads and writes the text files below a storage root. [registry::Registry] compiles each file into a
//! node and describes its inputs and outputs to a host.
//!
pub mod column;
pub mod document;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod util;
pub mod validate;
pub mod value;
