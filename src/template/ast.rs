//! Parsed template representation.

/// A compiled template, ready to execute any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
}

/// One node of a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted verbatim.
    Text(String),
    /// `{{ pipeline }}`; printed unless it declares variables.
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
    Break,
    Continue,
}

/// The shared shape of `if`, `range`, and `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Option<Vec<Node>>,
}

/// `$a, $b := cmd | cmd ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Variables declared (`:=`) or assigned (`=`) by this pipeline.
    pub decl: Vec<String>,
    pub is_assign: bool,
    pub cmds: Vec<Command>,
}

/// One stage of a pipeline: an operand followed by its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Operand>,
}

/// Something that evaluates to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// `.A.B`, resolved against dot.
    Field(Vec<String>),
    /// `$x.A.B`; `fields` may be empty.
    Variable { name: String, fields: Vec<String> },
    /// A function name.
    Function(String),
    /// `(pipeline).A.B`; `fields` may be empty.
    Pipe {
        pipe: Box<Pipeline>,
        fields: Vec<String>,
    },
}

impl Operand {
    /// Literals cannot start a command that is given arguments.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Operand::Nil | Operand::Bool(_) | Operand::Int(_) | Operand::Float(_) | Operand::String(_)
        )
    }
}
