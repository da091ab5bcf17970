// AST (Abstract Syntax Tree) definitions for the compiler

use std::fmt;

/// Index of a node inside its [`Ast`] arena
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Value type of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Not a value-producing node
    Na,
    I32,
    I64,
    F32,
    F64,
    Void,
}

impl DataType {
    /// Maps a source type keyword to its data type
    pub fn from_keyword(keyword: &str) -> Option<DataType> {
        match keyword {
            "int" => Some(DataType::I32),
            "long" => Some(DataType::I64),
            "float" => Some(DataType::F32),
            "double" => Some(DataType::F64),
            "void" => Some(DataType::Void),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DataType::I32 | DataType::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// True for the four numeric types a value can have
    pub fn is_value(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Na => "na",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Void => "void",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    GlobalVar,
    GlobalConst,
    Function,
    FuncParams,
    FuncBody,
    LocalVar,
    LocalConst,
    Parameter,
    ImportFunc,
    ExportFunc,
    ArrayAlloc,
    Statement,
    Expression,
    Number,
    Operator,
    Cast,
    FunctionCall,
    LocalGet,
    LocalSet,
    GlobalGet,
    GlobalSet,
    ArrayGet,
    ArraySet,
    ArrayIndex,
    ArrayValue,
    If,
    Then,
    Else,
    Condition,
    For,
    While,
    Do,
    LoopBody,
    Break,
    Continue,
    Return,
}

impl NodeKind {
    /// Kinds that introduce a name visible to lookups
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::LocalVar
                | NodeKind::LocalConst
                | NodeKind::Parameter
                | NodeKind::GlobalVar
                | NodeKind::GlobalConst
                | NodeKind::Function
                | NodeKind::ImportFunc
                | NodeKind::ArrayAlloc
        )
    }

    /// Kinds that produce a value and may stand as an expression operand
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            NodeKind::Number
                | NodeKind::Expression
                | NodeKind::FunctionCall
                | NodeKind::LocalGet
                | NodeKind::GlobalGet
                | NodeKind::ArrayGet
        )
    }

    pub fn is_loop(self) -> bool {
        matches!(self, NodeKind::For | NodeKind::While | NodeKind::Do)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::GlobalVar => "globalVar",
            NodeKind::GlobalConst => "globalConst",
            NodeKind::Function => "function",
            NodeKind::FuncParams => "funcParams",
            NodeKind::FuncBody => "funcBody",
            NodeKind::LocalVar => "localVar",
            NodeKind::LocalConst => "localConst",
            NodeKind::Parameter => "parameter",
            NodeKind::ImportFunc => "importFunc",
            NodeKind::ExportFunc => "exportFunc",
            NodeKind::ArrayAlloc => "arrayAlloc",
            NodeKind::Statement => "statement",
            NodeKind::Expression => "expression",
            NodeKind::Number => "number",
            NodeKind::Operator => "operator",
            NodeKind::Cast => "cast",
            NodeKind::FunctionCall => "functionCall",
            NodeKind::LocalGet => "localGet",
            NodeKind::LocalSet => "localSet",
            NodeKind::GlobalGet => "globalGet",
            NodeKind::GlobalSet => "globalSet",
            NodeKind::ArrayGet => "arrayGet",
            NodeKind::ArraySet => "arraySet",
            NodeKind::ArrayIndex => "arrayIndex",
            NodeKind::ArrayValue => "arrayValue",
            NodeKind::If => "if",
            NodeKind::Then => "then",
            NodeKind::Else => "else",
            NodeKind::Condition => "condition",
            NodeKind::For => "for",
            NodeKind::While => "while",
            NodeKind::Do => "do",
            NodeKind::LoopBody => "loopBody",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Return => "return",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpSymbol {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,   // **
    Caret, // ^
    // Shifts
    Shl,
    Shr,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Logical
    And,
    Or,
    // Prefix
    Neg, // -x
    Not, // !x
}

impl OpSymbol {
    /// Maps a binary operator token to its symbol
    pub fn from_binary(text: &str) -> Option<OpSymbol> {
        let op = match text {
            "+" => OpSymbol::Add,
            "-" => OpSymbol::Sub,
            "*" => OpSymbol::Mul,
            "/" => OpSymbol::Div,
            "%" => OpSymbol::Rem,
            "**" => OpSymbol::Pow,
            "^" => OpSymbol::Caret,
            "<<" => OpSymbol::Shl,
            ">>" => OpSymbol::Shr,
            "<" => OpSymbol::Lt,
            "<=" => OpSymbol::Le,
            ">" => OpSymbol::Gt,
            ">=" => OpSymbol::Ge,
            "==" => OpSymbol::Eq,
            "!=" => OpSymbol::Ne,
            "&&" => OpSymbol::And,
            "||" => OpSymbol::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Maps a prefix operator token to its symbol
    pub fn from_prefix(text: &str) -> Option<OpSymbol> {
        match text {
            "-" => Some(OpSymbol::Neg),
            "!" => Some(OpSymbol::Not),
            _ => None,
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            OpSymbol::Neg | OpSymbol::Not => 14,
            OpSymbol::Pow | OpSymbol::Caret => 13,
            OpSymbol::Mul | OpSymbol::Div | OpSymbol::Rem => 12,
            OpSymbol::Add | OpSymbol::Sub => 11,
            OpSymbol::Shl | OpSymbol::Shr => 10,
            OpSymbol::Lt | OpSymbol::Le | OpSymbol::Gt | OpSymbol::Ge => 9,
            OpSymbol::Eq | OpSymbol::Ne => 8,
            OpSymbol::And => 4,
            OpSymbol::Or => 3,
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, OpSymbol::Neg | OpSymbol::Not)
    }

    /// Operators whose result is an `i32` truth value
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            OpSymbol::Lt
                | OpSymbol::Le
                | OpSymbol::Gt
                | OpSymbol::Ge
                | OpSymbol::Eq
                | OpSymbol::Ne
                | OpSymbol::And
                | OpSymbol::Or
        )
    }

    pub fn text(self) -> &'static str {
        match self {
            OpSymbol::Add => "+",
            OpSymbol::Sub => "-",
            OpSymbol::Mul => "*",
            OpSymbol::Div => "/",
            OpSymbol::Rem => "%",
            OpSymbol::Pow => "**",
            OpSymbol::Caret => "^",
            OpSymbol::Shl => "<<",
            OpSymbol::Shr => ">>",
            OpSymbol::Lt => "<",
            OpSymbol::Le => "<=",
            OpSymbol::Gt => ">",
            OpSymbol::Ge => ">=",
            OpSymbol::Eq => "==",
            OpSymbol::Ne => "!=",
            OpSymbol::And => "&&",
            OpSymbol::Or => "||",
            OpSymbol::Neg => "-",
            OpSymbol::Not => "!",
        }
    }
}

/// Precedence of a cast marker `(type)`
pub const CAST_PRECEDENCE: u8 = 17;

/// A numeric literal as written in the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Per-kind payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Empty,
    /// Variable, function or array name
    Name(String),
    Number(Number),
    Operator(OpSymbol),
    /// Loop index of `break` / `continue`
    Index(u32),
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Empty => Ok(()),
            NodeValue::Name(name) => f.write_str(name),
            NodeValue::Number(n) => write!(f, "{}", n),
            NodeValue::Operator(op) => f.write_str(op.text()),
            NodeValue::Index(i) => write!(f, "{}", i),
        }
    }
}

/// One AST vertex
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub value: NodeValue,
    pub data_type: DataType,
    /// Owned children in evaluation order
    pub children: Vec<NodeId>,
    /// Non-owning back-reference used by scope lookups
    pub parent: Option<NodeId>,
    pub location: SourceLocation,
    /// Auxiliary static text (import module/name, export alias)
    pub data: Vec<String>,
}

impl Node {
    /// Name carried by declarations, references and calls; empty otherwise
    pub fn name(&self) -> &str {
        match &self.value {
            NodeValue::Name(name) => name,
            _ => "",
        }
    }
}

/// Arena holding the whole tree; node 0 is the module root
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Ast {
            nodes: vec![Node {
                kind: NodeKind::Module,
                value: NodeValue::Empty,
                data_type: DataType::Na,
                children: Vec::new(),
                parent: None,
                location: SourceLocation::new(1, 1),
                data: Vec::new(),
            }],
        }
    }

    /// Creates a node and appends it to `parent`'s children
    pub fn add(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        value: NodeValue,
        data_type: DataType,
        location: SourceLocation,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            value,
            data_type,
            children: Vec::new(),
            parent: Some(parent),
            location,
            data: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Replaces the children of `id`, re-pointing their parent links
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child].parent = Some(id);
        }
        self.nodes[id].children = children;
    }

    /// Last direct child of `id`, if any
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].children.last().copied()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, level: usize) -> fmt::Result {
        let node = &self.nodes[id];
        write!(f, "{}{}", "    ".repeat(level), node.kind)?;
        if node.value != NodeValue::Empty {
            write!(f, " {}", node.value)?;
        }
        if node.data_type != DataType::Na {
            write!(f, ": {}", node.data_type)?;
        }
        for &child in &node.children {
            writeln!(f)?;
            self.write_node(f, child, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, Ast::ROOT, 0)
    }
}
