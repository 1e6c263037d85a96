//! # Symbols
//!
//! Symbol objects stored in scope symbol tables: types, variables and
//! functions. A name maps to a [`SymbolHolder`], which is either a single
//! type/variable symbol or a [`FunctionHolder`] aggregating every overload
//! declared under that identifier.
//!
//! Symbols never point back into the scope tree; they carry their declaring
//! scope as a path (plus the owning file URI) and are re-fetched through the
//! global scope root whenever live state (base lists, member tables) is
//! needed.

use std::sync::Arc;

use angelscript_parser::ast::{
    AccessRestriction, FunctionDef, PrimitiveType, Span, Spanned,
};

use crate::hints::{ReferencedKind, SymbolLocation};
use crate::scope::ScopePath;
use crate::types::ResolvedType;

/// Discriminates what a type symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    Enum,
    Class,
    Interface,
    /// `typedef` alias; builtins carry no AST node, so the underlying
    /// primitive is stored directly.
    Typedef(PrimitiveType),
    TemplateParameter,
}

/// A named type: primitive, enum, class, interface, typedef or template
/// parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    pub name: Spanned<String>,
    /// URI of the file whose global scope owns the declaration.
    pub defined_in: Arc<str>,
    pub declared_scope: ScopePath,
    /// Present iff the type has a body scope (class, interface, enum).
    pub members_scope: Option<ScopePath>,
    pub template_params: Vec<String>,
    /// Resolved base list; filled by the deferred class-hoist task.
    pub bases: Vec<ResolvedType>,
    pub kind: TypeKind,
}

impl TypeSymbol {
    /// The underlying primitive, looking through typedefs.
    pub const fn primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            TypeKind::Primitive(p) | TypeKind::Typedef(p) => Some(p),
            _ => None,
        }
    }

    pub fn location(&self) -> SymbolLocation {
        SymbolLocation {
            uri: Arc::clone(&self.defined_in),
            scope: self.declared_scope.clone(),
            name: self.name.value().clone(),
            name_span: self.name.span(),
            kind: ReferencedKind::from_type_kind(self.kind),
        }
    }
}

/// A variable, parameter, member field, enum member or synthesized property.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: Spanned<String>,
    pub defined_in: Arc<str>,
    pub declared_scope: ScopePath,
    pub ty: ResolvedType,
    pub is_instance_member: bool,
    pub access: AccessRestriction,
}

impl VariableSymbol {
    pub fn location(&self) -> SymbolLocation {
        SymbolLocation {
            uri: Arc::clone(&self.defined_in),
            scope: self.declared_scope.clone(),
            name: self.name.value().clone(),
            name_span: self.name.span(),
            kind: ReferencedKind::Variable,
        }
    }
}

/// One resolved function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: Option<String>,
    pub ty: ResolvedType,
    pub has_default: bool,
}

/// A function or method; one overload within a [`FunctionHolder`].
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    pub name: Spanned<String>,
    pub defined_in: Arc<str>,
    pub declared_scope: ScopePath,
    pub return_type: ResolvedType,
    /// Filled by the deferred parameter-resolution hoist task.
    pub params: Vec<ParamInfo>,
    /// The anonymous scope holding parameters and the body; `None` for
    /// funcdefs and bodiless declarations.
    pub body_scope: Option<ScopePath>,
    pub is_instance_member: bool,
    pub access: AccessRestriction,
    pub template_params: Vec<String>,
    pub node: Option<Arc<Spanned<FunctionDef>>>,
}

impl FunctionSymbol {
    pub fn location(&self) -> SymbolLocation {
        SymbolLocation {
            uri: Arc::clone(&self.defined_in),
            scope: self.declared_scope.clone(),
            name: self.name.value().clone(),
            name_span: self.name.span(),
            kind: ReferencedKind::Function,
        }
    }

    /// Human-readable signature, used in overload dumps and signature help.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| match &p.name {
                Some(name) => format!("{} {}", p.ty.display(), name),
                None => p.ty.display(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} {}({})",
            self.return_type.display(),
            self.name.value(),
            params
        )
    }

    /// Byte offset of each parameter label inside [`Self::signature`],
    /// as `(start, end)` pairs for LSP `ParameterInformation`.
    pub fn parameter_label_offsets(&self) -> Vec<(u32, u32)> {
        let mut offsets = Vec::new();
        let prefix = format!("{} {}(", self.return_type.display(), self.name.value());
        let mut cursor = prefix.len() as u32;
        for (i, p) in self.params.iter().enumerate() {
            let label = match &p.name {
                Some(name) => format!("{} {}", p.ty.display(), name),
                None => p.ty.display(),
            };
            let len = label.len() as u32;
            offsets.push((cursor, cursor + len));
            cursor += len;
            if i + 1 < self.params.len() {
                cursor += 2; // ", "
            }
        }
        offsets
    }
}

/// A symbol to insert into a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Type(TypeSymbol),
    Variable(VariableSymbol),
    Function(FunctionSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Self::Type(s) => s.name.value(),
            Self::Variable(s) => s.name.value(),
            Self::Function(s) => s.name.value(),
        }
    }

    pub fn name_span(&self) -> Span {
        match self {
            Self::Type(s) => s.name.span(),
            Self::Variable(s) => s.name.span(),
            Self::Function(s) => s.name.span(),
        }
    }
}

/// A non-empty, declaration-ordered list of overloads sharing one name.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHolder {
    pub overloads: Vec<FunctionSymbol>,
}

impl FunctionHolder {
    pub fn new(first: FunctionSymbol) -> Self {
        Self {
            overloads: vec![first],
        }
    }

    pub fn first(&self) -> &FunctionSymbol {
        &self.overloads[0]
    }
}

/// What a name in a symbol table resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolHolder {
    Type(TypeSymbol),
    Variable(VariableSymbol),
    Functions(FunctionHolder),
}

impl SymbolHolder {
    pub fn name(&self) -> &str {
        match self {
            Self::Type(s) => s.name.value(),
            Self::Variable(s) => s.name.value(),
            Self::Functions(h) => h.first().name.value(),
        }
    }

    pub fn name_span(&self) -> Span {
        match self {
            Self::Type(s) => s.name.span(),
            Self::Variable(s) => s.name.span(),
            Self::Functions(h) => h.first().name.span(),
        }
    }

    pub fn location(&self) -> SymbolLocation {
        match self {
            Self::Type(s) => s.location(),
            Self::Variable(s) => s.location(),
            Self::Functions(h) => h.first().location(),
        }
    }

    pub const fn as_type(&self) -> Option<&TypeSymbol> {
        match self {
            Self::Type(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_variable(&self) -> Option<&VariableSymbol> {
        match self {
            Self::Variable(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_functions(&self) -> Option<&FunctionHolder> {
        match self {
            Self::Functions(h) => Some(h),
            _ => None,
        }
    }
}

impl From<Symbol> for SymbolHolder {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Type(s) => Self::Type(s),
            Symbol::Variable(s) => Self::Variable(s),
            Symbol::Function(s) => Self::Functions(FunctionHolder::new(s)),
        }
    }
}
