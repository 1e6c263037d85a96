//! # Resolved Types
//!
//! A [`ResolvedType`] is the computed value of a type expression: a type (or
//! funcdef) symbol snapshot, optional template argument bindings, and
//! modifier flags. It is immutable after construction and cheap to copy;
//! anything that depends on *live* state (base lists, member tables) is
//! re-fetched through the scope tree instead of read from the snapshot.

use std::sync::Arc;

use angelscript_parser::ast::{PrimitiveType, RefModifier};
use rustc_hash::FxHashMap;

use crate::symbol::{FunctionSymbol, TypeKind, TypeSymbol};

/// Maps a type's template parameter names to the supplied resolved types.
pub type TemplateTranslator = FxHashMap<String, ResolvedType>;

/// Modifier flags on a resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeModifiers {
    pub is_const: bool,
    pub ref_mode: Option<RefModifier>,
    pub is_handle: bool,
    /// Fallback marker used when the configured array type cannot be
    /// resolved; `T[]` normally becomes `array<T>` instead.
    pub is_array: bool,
}

/// The symbol a resolved type points at.
#[derive(Debug, Clone)]
pub enum TypeSource {
    Type(Arc<TypeSymbol>),
    /// A funcdef used as a type.
    Function(Arc<FunctionSymbol>),
}

/// A computed type value. `source: None` means *unresolved*; unresolved
/// types propagate silently so one missing name does not cascade.
#[derive(Debug, Clone, Default)]
pub struct ResolvedType {
    pub source: Option<TypeSource>,
    pub translator: Option<Arc<TemplateTranslator>>,
    pub modifiers: TypeModifiers,
}

impl ResolvedType {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn from_type(symbol: Arc<TypeSymbol>) -> Self {
        Self {
            source: Some(TypeSource::Type(symbol)),
            translator: None,
            modifiers: TypeModifiers::default(),
        }
    }

    pub fn from_funcdef(symbol: Arc<FunctionSymbol>) -> Self {
        Self {
            source: Some(TypeSource::Function(symbol)),
            translator: None,
            modifiers: TypeModifiers::default(),
        }
    }

    pub const fn is_unresolved(&self) -> bool {
        self.source.is_none()
    }

    pub const fn type_symbol(&self) -> Option<&Arc<TypeSymbol>> {
        match &self.source {
            Some(TypeSource::Type(symbol)) => Some(symbol),
            _ => None,
        }
    }

    pub const fn funcdef_symbol(&self) -> Option<&Arc<FunctionSymbol>> {
        match &self.source {
            Some(TypeSource::Function(symbol)) => Some(symbol),
            _ => None,
        }
    }

    /// The underlying primitive, looking through typedefs. Arrays and
    /// handles are never primitive.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        if self.modifiers.is_array || self.modifiers.is_handle {
            return None;
        }
        self.type_symbol().and_then(|s| s.primitive())
    }

    pub fn is_void(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Void)
    }

    pub fn is_bool(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Bool)
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(PrimitiveType::is_numeric)
    }

    pub fn is_integer(&self) -> bool {
        self.primitive().is_some_and(PrimitiveType::is_integer)
    }

    /// True for class/interface values, which may carry handles and
    /// operator overloads.
    pub fn is_object(&self) -> bool {
        self.type_symbol()
            .is_some_and(|s| matches!(s.kind, TypeKind::Class | TypeKind::Interface))
    }

    pub fn with_modifiers(mut self, modifiers: TypeModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_translator(mut self, translator: Option<Arc<TemplateTranslator>>) -> Self {
        self.translator = translator;
        self
    }

    /// Apply an instance's template bindings to a member's declared type:
    /// a bare template parameter `T` becomes the bound type, and template
    /// arguments are substituted recursively.
    pub fn substituted(&self, translator: Option<&Arc<TemplateTranslator>>) -> Self {
        let Some(translator) = translator else {
            return self.clone();
        };
        if let Some(symbol) = self.type_symbol() {
            if symbol.kind == TypeKind::TemplateParameter {
                if let Some(bound) = translator.get(symbol.name.value()) {
                    let mut result = bound.clone();
                    result.modifiers.is_const |= self.modifiers.is_const;
                    result.modifiers.is_handle |= self.modifiers.is_handle;
                    result.modifiers.is_array |= self.modifiers.is_array;
                    return result;
                }
            }
        }
        if let Some(own) = &self.translator {
            let substituted: TemplateTranslator = own
                .iter()
                .map(|(k, v)| (k.clone(), v.substituted(Some(translator))))
                .collect();
            let mut result = self.clone();
            result.translator = Some(Arc::new(substituted));
            return result;
        }
        self.clone()
    }

    /// Structural identity: same declaration, same bindings, same modifiers.
    pub fn same_type(&self, other: &Self) -> bool {
        if self.modifiers != other.modifiers {
            return false;
        }
        let sources_match = match (&self.source, &other.source) {
            (None, None) => true,
            (Some(TypeSource::Type(a)), Some(TypeSource::Type(b))) => {
                // int32/int spell the same primitive
                if let (Some(pa), Some(pb)) = (a.primitive(), b.primitive()) {
                    pa == pb
                } else {
                    a.defined_in == b.defined_in
                        && a.declared_scope == b.declared_scope
                        && a.name.value() == b.name.value()
                }
            }
            (Some(TypeSource::Function(a)), Some(TypeSource::Function(b))) => {
                a.defined_in == b.defined_in
                    && a.declared_scope == b.declared_scope
                    && a.name.value() == b.name.value()
            }
            _ => false,
        };
        if !sources_match {
            return false;
        }
        match (&self.translator, &other.translator) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.same_type(w)))
            }
            _ => false,
        }
    }

    /// Render the type the way a user would write it.
    pub fn display(&self) -> String {
        let mut out = String::new();
        if self.modifiers.is_const {
            out.push_str("const ");
        }
        match &self.source {
            None => out.push('?'),
            Some(TypeSource::Type(symbol)) => {
                out.push_str(symbol.name.value());
                if !symbol.template_params.is_empty() {
                    let args = symbol
                        .template_params
                        .iter()
                        .map(|param| {
                            self.translator
                                .as_ref()
                                .and_then(|t| t.get(param))
                                .map_or_else(|| param.clone(), ResolvedType::display)
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push('<');
                    out.push_str(&args);
                    out.push('>');
                }
            }
            Some(TypeSource::Function(symbol)) => out.push_str(symbol.name.value()),
        }
        if self.modifiers.is_array {
            out.push_str("[]");
        }
        if self.modifiers.is_handle {
            out.push('@');
        }
        out
    }
}

impl PartialEq for ResolvedType {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}
