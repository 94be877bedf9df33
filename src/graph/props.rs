//! Component kinds and typed prop builders
//!
//! Nodes carry an open JSON prop bag on the wire. Known component kinds get
//! a typed builder so producers keep static checking; plugin-supplied kinds
//! fall back to `ComponentKind::Custom` with an open `Props` map.

use chunkflow_types::Props;
use serde_json::Value;
use std::fmt;

/// Render shape tag of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Layout,
    Card,
    TextBlock,
    List,
    ListItem,
    Button,
    Form,
    Field,
    Chart,
    Badge,
    /// Any tag the core does not know; rendered as a passthrough
    Custom(String),
}

impl ComponentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentKind::Layout => "Layout",
            ComponentKind::Card => "Card",
            ComponentKind::TextBlock => "TextBlock",
            ComponentKind::List => "List",
            ComponentKind::ListItem => "ListItem",
            ComponentKind::Button => "Button",
            ComponentKind::Form => "Form",
            ComponentKind::Field => "Field",
            ComponentKind::Chart => "Chart",
            ComponentKind::Badge => "Badge",
            ComponentKind::Custom(tag) => tag,
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag {
            "Layout" => ComponentKind::Layout,
            "Card" => ComponentKind::Card,
            "TextBlock" => ComponentKind::TextBlock,
            "List" => ComponentKind::List,
            "ListItem" => ComponentKind::ListItem,
            "Button" => ComponentKind::Button,
            "Form" => ComponentKind::Form,
            "Field" => ComponentKind::Field,
            "Chart" => ComponentKind::Chart,
            "Badge" => ComponentKind::Badge,
            other => ComponentKind::Custom(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ComponentKind::Custom(_))
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ComponentKind {
    fn from(tag: &str) -> Self {
        ComponentKind::parse(tag)
    }
}

/// Layout direction for `Layout` nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Vertical,
    Horizontal,
}

/// Typed props for the known component kinds.
///
/// `Open` is the escape hatch for dynamic props.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedProps {
    Layout {
        direction: Direction,
        gap: Option<u32>,
    },
    Card {
        title: String,
        subtitle: Option<String>,
    },
    TextBlock {
        content: String,
        format: Option<String>,
    },
    List {
        title: Option<String>,
    },
    ListItem {
        label: String,
        value: Option<Value>,
    },
    Button {
        label: String,
        action: String,
    },
    Badge {
        text: String,
        tone: Option<String>,
    },
    Open(Props),
}

impl TypedProps {
    /// The kind these props belong to, when it is implied
    pub fn kind(&self) -> Option<ComponentKind> {
        match self {
            TypedProps::Layout { .. } => Some(ComponentKind::Layout),
            TypedProps::Card { .. } => Some(ComponentKind::Card),
            TypedProps::TextBlock { .. } => Some(ComponentKind::TextBlock),
            TypedProps::List { .. } => Some(ComponentKind::List),
            TypedProps::ListItem { .. } => Some(ComponentKind::ListItem),
            TypedProps::Button { .. } => Some(ComponentKind::Button),
            TypedProps::Badge { .. } => Some(ComponentKind::Badge),
            TypedProps::Open(_) => None,
        }
    }

    pub fn into_props(self) -> Props {
        let mut props = Props::new();
        match self {
            TypedProps::Layout { direction, gap } => {
                let dir = match direction {
                    Direction::Vertical => "vertical",
                    Direction::Horizontal => "horizontal",
                };
                props.insert("direction".into(), dir.into());
                if let Some(gap) = gap {
                    props.insert("gap".into(), gap.into());
                }
            }
            TypedProps::Card { title, subtitle } => {
                props.insert("title".into(), title.into());
                if let Some(subtitle) = subtitle {
                    props.insert("subtitle".into(), subtitle.into());
                }
            }
            TypedProps::TextBlock { content, format } => {
                props.insert("content".into(), content.into());
                if let Some(format) = format {
                    props.insert("format".into(), format.into());
                }
            }
            TypedProps::List { title } => {
                if let Some(title) = title {
                    props.insert("title".into(), title.into());
                }
            }
            TypedProps::ListItem { label, value } => {
                props.insert("label".into(), label.into());
                if let Some(value) = value {
                    props.insert("value".into(), value);
                }
            }
            TypedProps::Button { label, action } => {
                props.insert("label".into(), label.into());
                props.insert("action".into(), action.into());
            }
            TypedProps::Badge { text, tone } => {
                props.insert("text".into(), text.into());
                if let Some(tone) = tone {
                    props.insert("tone".into(), tone.into());
                }
            }
            TypedProps::Open(open) => return open,
        }
        props
    }
}

impl From<TypedProps> for Props {
    fn from(typed: TypedProps) -> Self {
        typed.into_props()
    }
}
