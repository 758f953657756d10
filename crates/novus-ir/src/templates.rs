//! Template declarations, instantiated lazily and memoized by their
//! type-parameter tuple (spec glossary: "**Template**: parameterized type
//! or function; each distinct type-parameter tuple instantiates a distinct
//! `TypeId`/`FuncId`").

use rustc_hash::FxHashMap;

use crate::ids::{FuncId, TypeId};

/// name → `TypeId`, used inside a template body while instantiating (spec
/// glossary: "**TypeSubstitutionTable**").
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitutionTable {
    substitutions: FxHashMap<String, TypeId>,
}

impl TypeSubstitutionTable {
    pub fn new() -> Self {
        TypeSubstitutionTable {
            substitutions: FxHashMap::default(),
        }
    }

    pub fn bind(&mut self, name: String, ty: TypeId) {
        self.substitutions.insert(name, ty);
    }

    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.substitutions.get(name).copied()
    }
}

/// A type template's declared parameter names plus its memoized
/// instantiation cache. The declaration itself (the struct/union/enum
/// shape with substitution placeholders) is held by whichever parse-tree
/// reference the frontend keeps; this table only owns the cache, since
/// novus-ir has no parse-tree dependency.
#[derive(Clone, Debug, Default)]
pub struct TypeTemplate {
    pub param_names: Vec<String>,
    instances: FxHashMap<Vec<TypeId>, TypeId>,
}

impl TypeTemplate {
    pub fn new(param_names: Vec<String>) -> Self {
        TypeTemplate {
            param_names,
            instances: FxHashMap::default(),
        }
    }

    pub fn instance(&self, type_params: &[TypeId]) -> Option<TypeId> {
        self.instances.get(type_params).copied()
    }

    pub fn cache_instance(&mut self, type_params: Vec<TypeId>, id: TypeId) {
        self.instances.insert(type_params, id);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FuncTemplate {
    pub param_names: Vec<String>,
    instances: FxHashMap<Vec<TypeId>, FuncId>,
}

impl FuncTemplate {
    pub fn new(param_names: Vec<String>) -> Self {
        FuncTemplate {
            param_names,
            instances: FxHashMap::default(),
        }
    }

    pub fn instance(&self, type_params: &[TypeId]) -> Option<FuncId> {
        self.instances.get(type_params).copied()
    }

    pub fn cache_instance(&mut self, type_params: Vec<TypeId>, id: FuncId) {
        self.instances.insert(type_params, id);
    }
}

/// name → template, for both types and functions (spec §4.4: "Templated
/// declarations are registered into the `TypeTemplateTable` instead" /
/// "Templated functions go into `FuncTemplateTable`").
#[derive(Clone, Debug, Default)]
pub struct TypeTemplateTable {
    templates: FxHashMap<String, TypeTemplate>,
}

impl TypeTemplateTable {
    pub fn new() -> Self {
        TypeTemplateTable {
            templates: FxHashMap::default(),
        }
    }

    pub fn declare(&mut self, name: String, template: TypeTemplate) {
        self.templates.insert(name, template);
    }

    pub fn get(&self, name: &str) -> Option<&TypeTemplate> {
        self.templates.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeTemplate> {
        self.templates.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FuncTemplateTable {
    templates: FxHashMap<String, Vec<FuncTemplate>>,
}

impl FuncTemplateTable {
    pub fn new() -> Self {
        FuncTemplateTable {
            templates: FxHashMap::default(),
        }
    }

    /// Function templates, unlike type templates, may be overloaded: more
    /// than one template with the same name but different arity/shape.
    pub fn declare(&mut self, name: String, template: FuncTemplate) {
        self.templates.entry(name).or_default().push(template);
    }

    pub fn candidates(&self, name: &str) -> &[FuncTemplate] {
        self.templates.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn candidates_mut(&mut self, name: &str) -> Option<&mut Vec<FuncTemplate>> {
        self.templates.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_type_param_tuples_cache_distinct_instances() {
        let mut template = TypeTemplate::new(vec!["T".to_string()]);
        let int_id = TypeId::from_index(0);
        let float_id = TypeId::from_index(1);
        let list_of_int = TypeId::from_index(2);
        let list_of_float = TypeId::from_index(3);

        template.cache_instance(vec![int_id], list_of_int);
        template.cache_instance(vec![float_id], list_of_float);

        assert_eq!(template.instance(&[int_id]), Some(list_of_int));
        assert_eq!(template.instance(&[float_id]), Some(list_of_float));
    }

    #[test]
    fn func_templates_support_overloading_by_name() {
        let mut table = FuncTemplateTable::new();
        table.declare("identity".to_string(), FuncTemplate::new(vec!["T".to_string()]));
        table.declare(
            "identity".to_string(),
            FuncTemplate::new(vec!["T".to_string(), "U".to_string()]),
        );
        assert_eq!(table.candidates("identity").len(), 2);
    }
}
