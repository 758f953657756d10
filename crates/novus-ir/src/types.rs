//! Type declarations (spec §3 IR data model).

use indexmap::IndexMap;

use crate::ids::{FieldId, TypeId};

/// Ordered name → `{FieldId, TypeId}` table, insertion order preserved
/// (spec: "ordered `FieldDeclTable` ... insertion-order preserved").
#[derive(Debug, Clone, Default)]
pub struct FieldDeclTable {
    fields: IndexMap<String, (FieldId, TypeId)>,
}

impl FieldDeclTable {
    pub fn new() -> Self {
        FieldDeclTable {
            fields: IndexMap::new(),
        }
    }

    pub fn declare(&mut self, name: String, ty: TypeId) -> FieldId {
        let id = FieldId::from_index(self.fields.len());
        self.fields.insert(name, (id, ty));
        id
    }

    pub fn get(&self, name: &str) -> Option<(FieldId, TypeId)> {
        self.fields.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldId, TypeId)> {
        self.fields.iter().map(|(name, &(id, ty))| (name.as_str(), id, ty))
    }

    /// Position of a field within declaration order, for the backend's
    /// struct representation (spec §4.6: "0 fields -> null-struct; 1 field
    /// -> unboxed; >=2 -> struct", indexed by this position).
    pub fn position_of(&self, id: FieldId) -> Option<usize> {
        self.fields.values().position(|&(fid, _)| fid == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub fields: FieldDeclTable,
}

/// Ordered set of member `TypeId`s, uniqueness required (spec: "ordered set
/// of member `TypeId`s, uniqueness required").
#[derive(Debug, Clone, Default)]
pub struct UnionDef {
    pub members: Vec<TypeId>,
}

impl UnionDef {
    pub fn contains(&self, ty: TypeId) -> bool {
        self.members.contains(&ty)
    }
}

#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, Default)]
pub struct EnumDef {
    pub entries: Vec<EnumEntry>,
}

impl EnumDef {
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.entries.iter().find(|e| e.value == value).map(|e| e.name.as_str())
    }
}

/// `(TypeSet input, TypeId output, bool isAction)` (spec).
#[derive(Debug, Clone)]
pub struct DelegateDef {
    pub input: Vec<TypeId>,
    pub output: TypeId,
    pub is_action: bool,
}

#[derive(Debug, Clone)]
pub struct LazyDef {
    pub result: TypeId,
    pub is_action: bool,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Int,
    Long,
    Float,
    Bool,
    Char,
    String,
    Struct(StructDef),
    Union(UnionDef),
    Enum(EnumDef),
    Delegate(DelegateDef),
    Future(TypeId),
    Lazy(LazyDef),
    /// A compile-time integer value threaded through a template parameter
    /// (spec §4.4's `staticint_to_int` intrinsic).
    StaticInt(i64),
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
}

impl TypeInfo {
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Int | TypeKind::Long | TypeKind::Float | TypeKind::Bool | TypeKind::Char | TypeKind::String
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_decl_table_preserves_insertion_order() {
        let mut fields = FieldDeclTable::new();
        fields.declare("b".to_string(), TypeId::from_index(0));
        fields.declare("a".to_string(), TypeId::from_index(1));
        let names: Vec<&str> = fields.iter().map(|(n, _, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn enum_def_resolves_both_directions() {
        let def = EnumDef {
            entries: vec![
                EnumEntry { name: "Red".to_string(), value: 0 },
                EnumEntry { name: "Blue".to_string(), value: 1 },
            ],
        };
        assert_eq!(def.value_of("Blue"), Some(1));
        assert_eq!(def.name_of(0), Some("Red"));
    }
}
