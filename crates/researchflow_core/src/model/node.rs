//! Node entities: positions, snippets, metadata and the node record itself.
//!
//! # Invariants
//! - `NodeData::id` is unique within one project.
//! - A node's kind is carried by its metadata variant, so kind and metadata
//!   can never disagree.
//! - `Snippet::deep_copy` always mints a new id; snippets never alias.

use super::record::{
    f64_field, id_field, list_field, new_id, record_serde, str_field, string_list, text_field,
    Record,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 2D canvas coordinate. Copied, never shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Record for Position {
    fn to_record(&self) -> Value {
        json!({"x": self.x, "y": self.y})
    }

    fn from_record(value: &Value) -> Self {
        Self::new(f64_field(value, "x", 0.0), f64_field(value, "y", 0.0))
    }
}

record_serde!(Position);

/// Content kind of a snippet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SnippetKind {
    #[default]
    Text,
    /// `content` is a project-relative image path.
    Image,
}

impl SnippetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    /// Unknown values map to `Text`.
    pub fn parse(value: &str) -> Self {
        match value {
            "image" => Self::Image,
            _ => Self::Text,
        }
    }
}

/// Text or image content attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Snippet {
    pub id: String,
    pub kind: SnippetKind,
    /// Literal text, or an image path relative to the project root.
    pub content: String,
    /// Attribution label such as `From: <paper title>`.
    pub source_label: String,
}

impl Snippet {
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(SnippetKind::Text, content)
    }

    pub fn image(relative_path: impl Into<String>) -> Self {
        Self::with_kind(SnippetKind::Image, relative_path)
    }

    fn with_kind(kind: SnippetKind, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            content: content.into(),
            source_label: String::new(),
        }
    }

    /// Creates an independent copy with a new id.
    ///
    /// A non-empty `source_title` replaces the label with `From: <title>`;
    /// an empty one keeps the current label.
    pub fn deep_copy(&self, source_title: &str) -> Self {
        let source_label = if source_title.is_empty() {
            self.source_label.clone()
        } else {
            format!("From: {source_title}")
        };
        Self {
            id: new_id(),
            kind: self.kind,
            content: self.content.clone(),
            source_label,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == SnippetKind::Image
    }
}

impl Record for Snippet {
    fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind.as_str(),
            "content": self.content,
            "source_label": self.source_label,
        })
    }

    fn from_record(value: &Value) -> Self {
        Self {
            id: id_field(value, "id"),
            kind: SnippetKind::parse(&str_field(value, "type", "text")),
            content: str_field(value, "content", ""),
            source_label: str_field(value, "source_label", ""),
        }
    }
}

record_serde!(Snippet);

/// Role of a pipeline module node. Also the key space of module palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleType {
    Input,
    Output,
    Process,
    Decision,
}

impl ModuleType {
    pub const ALL: [ModuleType; 4] = [Self::Input, Self::Output, Self::Process, Self::Decision];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Process => "process",
            Self::Decision => "decision",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "process" => Some(Self::Process),
            "decision" => Some(Self::Decision),
            _ => None,
        }
    }
}

/// Node kind, serialized as the record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    PipelineModule,
    ReferencePaper,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PipelineModule => "pipeline_module",
            Self::ReferencePaper => "reference_paper",
        }
    }

    /// Unknown values map to `PipelineModule`.
    pub fn parse(value: &str) -> Self {
        match value {
            "reference_paper" => Self::ReferencePaper,
            _ => Self::PipelineModule,
        }
    }
}

/// Metadata of a reference paper node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperMetadata {
    pub title: String,
    pub year: String,
    pub conference: String,
    /// Project-relative path of the paper's markdown file, or empty.
    pub relative_path_to_md: String,
}

/// Metadata of a pipeline module node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub module_name: String,
    /// `None` when the record carried no recognizable module type.
    pub module_type: Option<ModuleType>,
}

/// Kind-specific node metadata.
///
/// On the wire this is a flat object carrying all six fields; fields that do
/// not belong to the variant are written as empty strings and ignored on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMetadata {
    PipelineModule(ModuleMetadata),
    ReferencePaper(PaperMetadata),
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self::PipelineModule(ModuleMetadata::default())
    }
}

impl NodeMetadata {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::PipelineModule(_) => NodeKind::PipelineModule,
            Self::ReferencePaper(_) => NodeKind::ReferencePaper,
        }
    }

    fn to_record(&self) -> Value {
        let empty = String::new();
        let (paper, module) = match self {
            Self::PipelineModule(module) => (None, Some(module)),
            Self::ReferencePaper(paper) => (Some(paper), None),
        };
        json!({
            "title": paper.map_or(&empty, |p| &p.title),
            "year": paper.map_or(&empty, |p| &p.year),
            "conference": paper.map_or(&empty, |p| &p.conference),
            "relative_path_to_md": paper.map_or(&empty, |p| &p.relative_path_to_md),
            "module_name": module.map_or(&empty, |m| &m.module_name),
            "module_type": module.and_then(|m| m.module_type).map_or("", ModuleType::as_str),
        })
    }

    fn from_record(kind: NodeKind, value: &Value) -> Self {
        match kind {
            NodeKind::ReferencePaper => Self::ReferencePaper(PaperMetadata {
                title: text_field(value, "title", ""),
                year: text_field(value, "year", ""),
                conference: text_field(value, "conference", ""),
                relative_path_to_md: str_field(value, "relative_path_to_md", ""),
            }),
            NodeKind::PipelineModule => Self::PipelineModule(ModuleMetadata {
                module_name: text_field(value, "module_name", ""),
                module_type: ModuleType::parse(&str_field(value, "module_type", "")),
            }),
        }
    }
}

/// One node on the project canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct NodeData {
    pub id: String,
    pub position: Position,
    /// Set-like list of tag names.
    pub tags: Vec<String>,
    pub metadata: NodeMetadata,
    pub snippets: Vec<Snippet>,
}

impl NodeData {
    pub fn pipeline_module(
        module_name: impl Into<String>,
        module_type: ModuleType,
        position: Position,
    ) -> Self {
        Self::with_metadata(
            NodeMetadata::PipelineModule(ModuleMetadata {
                module_name: module_name.into(),
                module_type: Some(module_type),
            }),
            position,
        )
    }

    pub fn reference_paper(paper: PaperMetadata, position: Position) -> Self {
        Self::with_metadata(NodeMetadata::ReferencePaper(paper), position)
    }

    pub fn with_metadata(metadata: NodeMetadata, position: Position) -> Self {
        Self {
            id: new_id(),
            position,
            tags: Vec::new(),
            metadata,
            snippets: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.metadata.kind()
    }

    /// Markdown path for reference papers that have one.
    pub fn paper_path(&self) -> Option<&str> {
        match &self.metadata {
            NodeMetadata::ReferencePaper(paper) if !paper.relative_path_to_md.is_empty() => {
                Some(paper.relative_path_to_md.as_str())
            }
            _ => None,
        }
    }

    /// Non-empty image paths held by this node's snippets.
    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        self.snippets
            .iter()
            .filter(|snippet| snippet.is_image() && !snippet.content.is_empty())
            .map(|snippet| snippet.content.as_str())
    }
}

impl Record for NodeData {
    fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind().as_str(),
            "position": self.position.to_record(),
            "tags": self.tags,
            "metadata": self.metadata.to_record(),
            "snippets": self.snippets.iter().map(Record::to_record).collect::<Vec<_>>(),
        })
    }

    fn from_record(value: &Value) -> Self {
        let kind = NodeKind::parse(&str_field(value, "type", "pipeline_module"));
        let metadata = value.get("metadata").unwrap_or(&Value::Null);
        Self {
            id: id_field(value, "id"),
            position: Position::from_record(value.get("position").unwrap_or(&Value::Null)),
            tags: string_list(value, "tags"),
            metadata: NodeMetadata::from_record(kind, metadata),
            snippets: list_field(value, "snippets")
                .iter()
                .map(Snippet::from_record)
                .collect(),
        }
    }
}

record_serde!(NodeData);
