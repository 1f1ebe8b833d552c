//! Class layout engine
//!
//! Fields and methods are kept in name order. A field's slot in the instance
//! struct is its rank among all (inherited and own) field names plus one,
//! since slot 0 holds the vtable pointer; a method's slot in the vtable is its
//! rank among all method names. Inheritance copies the parent's maps when the
//! child is opened, so a child's shape is frozen against later changes.

use super::error::{CompileError, CompileResult};
use super::ir::{FunctionId, GlobalId, IrModule, IrType, StructId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Instance slot holding the vtable pointer
pub const VTABLE_SLOT: u32 = 0;

/// Slots reserved at the start of every instance
pub const RESERVED_FIELDS: u32 = 1;

/// Method names with special meaning
pub const CONSTRUCTOR: &str = "constructor";
pub const CALL_OPERATOR: &str = "__call__";

/// Mangled name of a method function, e.g. `Point_getX`
pub fn mangle(class: &str, method: &str) -> String {
    format!("{}_{}", class, method)
}

/// Name of both the vtable struct type and its global, e.g. `Point_vTable`
pub fn vtable_name(class: &str) -> String {
    format!("{}_vTable", class)
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub struct_id: StructId,
    pub parent: Option<String>,
    pub fields: BTreeMap<String, IrType>,
    pub methods: BTreeMap<String, FunctionId>,
    /// Set once the layout is finalized
    pub vtable: Option<VTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTable {
    pub struct_id: StructId,
    pub global: GlobalId,
}

impl ClassInfo {
    pub fn field_slot(&self, name: &str) -> Option<u32> {
        self.fields
            .keys()
            .position(|f| f == name)
            .map(|rank| rank as u32 + RESERVED_FIELDS)
    }

    pub fn method_slot(&self, name: &str) -> Option<u32> {
        self.methods
            .keys()
            .position(|m| m == name)
            .map(|rank| rank as u32)
    }

    pub fn method(&self, name: &str) -> Option<FunctionId> {
        self.methods.get(name).copied()
    }

    /// Pointer-to-instance type, `%Name*`
    pub fn instance_type(&self) -> IrType {
        IrType::ptr_to(IrType::Struct(self.struct_id))
    }

    /// Instance struct body: vtable pointer, then fields in slot order
    pub fn struct_body(&self, vtable_struct: StructId) -> Vec<IrType> {
        std::iter::once(IrType::ptr_to(IrType::Struct(vtable_struct)))
            .chain(self.fields.values().cloned())
            .collect()
    }

    pub fn unknown_member(&self, member: &str) -> CompileError {
        CompileError::UnknownMember {
            class: self.name.clone(),
            member: member.to_string(),
        }
    }
}

/// Registry of every class compiled so far
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassInfo>,
    by_struct: FxHashMap<StructId, String>,
    order: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, flattening the parent's fields and methods into it
    pub fn open(
        &mut self,
        name: &str,
        struct_id: StructId,
        parent: Option<&str>,
    ) -> CompileResult<&mut ClassInfo> {
        if self.contains(name) {
            return Err(CompileError::DuplicateDefinition {
                name: format!("class {}", name),
            });
        }

        let (fields, methods) = match parent {
            Some(parent_name) => {
                let parent = self.lookup(parent_name)?;
                (parent.fields.clone(), parent.methods.clone())
            }
            None => (BTreeMap::new(), BTreeMap::new()),
        };

        log::debug!(
            "open class {} (parent: {}, inherited fields: {}, inherited methods: {})",
            name,
            parent.unwrap_or("none"),
            fields.len(),
            methods.len()
        );

        self.by_struct.insert(struct_id, name.to_string());
        self.order.push(name.to_string());
        Ok(self
            .classes
            .entry(name.to_string())
            .or_insert(ClassInfo {
                name: name.to_string(),
                struct_id,
                parent: parent.map(str::to_string),
                fields,
                methods,
                vtable: None,
            }))
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassInfo> {
        self.classes.get_mut(name)
    }

    /// Like `get`, failing with `UnknownClass`
    pub fn lookup(&self, name: &str) -> CompileResult<&ClassInfo> {
        self.get(name).ok_or_else(|| CompileError::UnknownClass {
            name: name.to_string(),
        })
    }

    /// The class whose instance struct is `id`
    pub fn by_struct(&self, id: StructId) -> Option<&ClassInfo> {
        self.by_struct.get(&id).and_then(|name| self.get(name))
    }

    /// The class an instance pointer type points at
    pub fn class_of_type(&self, ty: &IrType) -> Option<&ClassInfo> {
        ty.pointee_struct().and_then(|id| self.by_struct(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Classes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    /// Slot tables of every class, for reporting
    pub fn layouts(&self, module: &IrModule) -> Vec<ClassLayout> {
        self.iter().map(|class| ClassLayout::new(class, module)).collect()
    }
}

/// Serializable summary of a class's slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLayout {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldSlot>,
    pub methods: Vec<MethodSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSlot {
    pub name: String,
    pub slot: u32,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSlot {
    pub name: String,
    pub slot: u32,
    /// Function the vtable entry points at; inherited entries name the parent's function
    pub function: String,
}

impl ClassLayout {
    pub fn new(class: &ClassInfo, module: &IrModule) -> Self {
        let fields = class
            .fields
            .iter()
            .zip(RESERVED_FIELDS..)
            .map(|((name, ty), slot)| FieldSlot {
                name: name.clone(),
                slot,
                ty: module.type_name(ty),
            })
            .collect();
        let methods = class
            .methods
            .iter()
            .zip(0..)
            .map(|((name, func), slot)| MethodSlot {
                name: name.clone(),
                slot,
                function: module
                    .get_function(*func)
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            name: class.name.clone(),
            parent: class.parent.clone(),
            fields,
            methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_point() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        let point = registry.open("Point", StructId(0), None).expect("open");
        point.fields.insert("y".to_string(), IrType::I32);
        point.fields.insert("x".to_string(), IrType::I32);
        point.methods.insert("getX".to_string(), FunctionId(1));
        point.methods.insert("constructor".to_string(), FunctionId(2));
        registry
    }

    #[test]
    fn test_field_slots_are_alphabetical_plus_one() {
        let registry = registry_with_point();
        let point = registry.get("Point").expect("Point");
        assert_eq!(point.field_slot("x"), Some(1));
        assert_eq!(point.field_slot("y"), Some(2));
        assert_eq!(point.field_slot("z"), None);
    }

    #[test]
    fn test_method_slots_are_alphabetical() {
        let registry = registry_with_point();
        let point = registry.get("Point").expect("Point");
        assert_eq!(point.method_slot("constructor"), Some(0));
        assert_eq!(point.method_slot("getX"), Some(1));
    }

    #[test]
    fn test_inheritance_copies_parent_maps() {
        let mut registry = registry_with_point();
        let child = registry
            .open("Point3D", StructId(5), Some("Point"))
            .expect("open");
        child.fields.insert("z".to_string(), IrType::I32);
        child.methods.insert("getX".to_string(), FunctionId(9));

        let parent = registry.get("Point").expect("Point");
        let child = registry.get("Point3D").expect("Point3D");
        assert_eq!(parent.fields.len(), 2);
        assert_eq!(child.field_slot("z"), Some(3));
        // override keeps the slot and replaces the function
        assert_eq!(child.method_slot("getX"), parent.method_slot("getX"));
        assert_eq!(child.method("getX"), Some(FunctionId(9)));
        assert_eq!(parent.method("getX"), Some(FunctionId(1)));
        assert_eq!(child.parent.as_deref(), Some("Point"));
    }

    #[test]
    fn test_open_unknown_parent() {
        let mut registry = ClassRegistry::new();
        let err = registry.open("B", StructId(0), Some("A")).unwrap_err();
        assert!(matches!(err, CompileError::UnknownClass { name } if name == "A"));
    }

    #[test]
    fn test_open_duplicate_class() {
        let mut registry = registry_with_point();
        let err = registry.open("Point", StructId(7), None).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_lookup_by_instance_type() {
        let registry = registry_with_point();
        let ty = IrType::ptr_to(IrType::Struct(StructId(0)));
        assert_eq!(registry.class_of_type(&ty).map(|c| c.name.as_str()), Some("Point"));
        assert!(registry.class_of_type(&IrType::I32).is_none());
    }

    #[test]
    fn test_struct_body_starts_with_vtable_pointer() {
        let registry = registry_with_point();
        let body = registry.get("Point").expect("Point").struct_body(StructId(1));
        assert_eq!(
            body,
            vec![
                IrType::ptr_to(IrType::Struct(StructId(1))),
                IrType::I32,
                IrType::I32
            ]
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(mangle("Point", "getX"), "Point_getX");
        assert_eq!(mangle("Point", CALL_OPERATOR), "Point___call__");
        assert_eq!(vtable_name("Point"), "Point_vTable");
    }
}
