//! In-memory host runtime used to stub the loaded-entity graph in tests

use std::cell::RefCell;
use std::collections::HashMap;

use super::{
    AccessFailure, ClassFacts, ImportFailure, Origin, Probe, Runtime, RuntimeFault, Traits,
};
use crate::core::model::{LineRange, Signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone)]
enum Slot {
    Bound(EntityId),
    Raises(String),
}

#[derive(Debug, Clone)]
enum Unit {
    Loaded(EntityId),
    Broken(String),
}

#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub traits: Traits,
    pub origin: Option<Origin>,
    pub signature: Option<Signature>,
    pub docstring: Option<String>,
    pub source_file: Option<String>,
    pub source_lines: Option<(String, LineRange)>,
    pub value: Option<String>,
    pub type_name: Option<String>,
    pub class_facts: Option<ClassFacts>,

    /// Every probe on this entity fails
    pub faulty: bool,

    members: Vec<(String, Slot)>,
    submodules: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryRuntime {
    entities: Vec<Entity>,
    units: HashMap<String, Unit>,
    loads: RefCell<Vec<String>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    fn unit(&mut self, dotted: &str, is_package: bool) -> EntityId {
        let id = self.push(Entity {
            traits: Traits {
                is_module: true,
                is_package,
                ..Traits::default()
            },
            origin: Some(Origin::new(dotted, None)),
            source_file: Some(format!("/lib/{}.py", dotted.replace('.', "/"))),
            ..Entity::default()
        });
        self.units.insert(dotted.to_string(), Unit::Loaded(id));

        // Register with the parent package so it can be discovered
        if let Some((parent, leaf)) = dotted.rsplit_once('.') {
            if let Some(Unit::Loaded(parent_id)) = self.units.get(parent).cloned() {
                self.entities[parent_id.0].submodules.push(leaf.to_string());
            }
        }
        id
    }

    pub fn package(&mut self, dotted: &str) -> EntityId {
        self.unit(dotted, true)
    }

    pub fn module(&mut self, dotted: &str) -> EntityId {
        self.unit(dotted, false)
    }

    /// A unit that raises while loading
    pub fn broken_unit(&mut self, dotted: &str, detail: &str) {
        self.units
            .insert(dotted.to_string(), Unit::Broken(detail.to_string()));
    }

    pub fn class(&mut self, module: &str, qualname: &str) -> EntityId {
        self.push(Entity {
            traits: Traits {
                is_class: true,
                is_callable: true,
                ..Traits::default()
            },
            origin: Some(Origin::new(module, Some(qualname))),
            signature: Some(Signature::default()),
            class_facts: Some(ClassFacts::default()),
            ..Entity::default()
        })
    }

    pub fn function(&mut self, module: &str, qualname: &str) -> EntityId {
        let attached = qualname.contains('.');
        self.push(Entity {
            traits: Traits {
                is_routine: true,
                is_class_attached: attached,
                is_callable: true,
                has_get: true,
                ..Traits::default()
            },
            origin: Some(Origin::new(module, Some(qualname))),
            signature: Some(Signature::default()),
            source_file: Some(format!("/lib/{}.py", module.replace('.', "/"))),
            source_lines: Some((
                format!("def {}():\n    pass\n", qualname.rsplit('.').next().unwrap_or(qualname)),
                LineRange { start: 1, end: 2 },
            )),
            ..Entity::default()
        })
    }

    pub fn async_function(&mut self, module: &str, qualname: &str) -> EntityId {
        let id = self.function(module, qualname);
        self.entities[id.0].traits.is_async = true;
        id
    }

    /// A method bound to a module-level instance
    pub fn bound_method(&mut self, module: &str, qualname: &str) -> EntityId {
        let id = self.function(module, qualname);
        let entity = &mut self.entities[id.0];
        entity.traits.has_get = false;
        entity.origin = entity.origin.take().map(Origin::on_instance);
        id
    }

    /// A compiled routine with no signature and no text origin
    pub fn builtin(&mut self, qualname: &str) -> EntityId {
        self.push(Entity {
            traits: Traits {
                is_routine: true,
                is_class_attached: qualname.contains('.'),
                is_callable: true,
                ..Traits::default()
            },
            origin: Some(Origin::new("builtins", Some(qualname))),
            ..Entity::default()
        })
    }

    pub fn property(&mut self, module: &str, qualname: &str) -> EntityId {
        self.push(Entity {
            traits: Traits {
                is_property: true,
                has_get: true,
                has_set: true,
                ..Traits::default()
            },
            origin: Some(Origin::new(module, Some(qualname))),
            ..Entity::default()
        })
    }

    /// A compiled attribute descriptor, reporting the class that owns it
    pub fn descriptor(&mut self, module: &str, qualname: &str) -> EntityId {
        self.push(Entity {
            traits: Traits {
                has_get: true,
                has_set: true,
                ..Traits::default()
            },
            origin: Some(Origin::new(module, Some(qualname))),
            docstring: Some("attribute descriptor".into()),
            ..Entity::default()
        })
    }

    /// A plain value with no self-reported origin
    pub fn constant(&mut self, repr: &str, type_name: &str) -> EntityId {
        self.push(Entity {
            value: Some(repr.to_string()),
            type_name: Some(type_name.to_string()),
            ..Entity::default()
        })
    }

    pub fn bind(&mut self, container: EntityId, name: &str, member: EntityId) {
        self.entities[container.0]
            .members
            .push((name.to_string(), Slot::Bound(member)));
    }

    /// A listed member whose access raises
    pub fn bind_raising(&mut self, container: EntityId, name: &str, detail: &str) {
        self.entities[container.0]
            .members
            .push((name.to_string(), Slot::Raises(detail.to_string())));
    }

    /// Units loaded so far, in order
    pub fn loads(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }

    fn get(&self, id: &EntityId) -> Probe<&Entity> {
        let entity = self
            .entities
            .get(id.0)
            .ok_or_else(|| RuntimeFault(format!("dangling entity {}", id.0)))?;
        if entity.faulty {
            return Err(RuntimeFault(format!("entity {} is unreadable", id.0)));
        }
        Ok(entity)
    }
}

impl Runtime for MemoryRuntime {
    type Ref = EntityId;

    fn import(&self, dotted: &str) -> Result<EntityId, ImportFailure> {
        let mut prefix = String::new();
        let mut found = None;

        // Parents load before children, like the host does
        for part in dotted.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(part);

            match self.units.get(&prefix) {
                None => {
                    return Err(ImportFailure::NotFound {
                        missing: prefix.clone(),
                    })
                }
                Some(Unit::Broken(detail)) => {
                    return Err(ImportFailure::Failed {
                        detail: detail.clone(),
                    })
                }
                Some(Unit::Loaded(id)) => found = Some(*id),
            }
        }

        self.loads.borrow_mut().push(dotted.to_string());
        found.ok_or_else(|| ImportFailure::NotFound {
            missing: dotted.to_string(),
        })
    }

    fn attribute(&self, target: &EntityId, name: &str) -> Result<EntityId, AccessFailure> {
        let entity = self.entities.get(target.0).ok_or(AccessFailure::Missing)?;
        match entity.members.iter().find(|(n, _)| n == name) {
            Some((_, Slot::Bound(id))) => Ok(*id),
            Some((_, Slot::Raises(detail))) => Err(AccessFailure::Raised {
                detail: detail.clone(),
            }),
            None => Err(AccessFailure::Missing),
        }
    }

    fn identity(&self, target: &EntityId) -> usize {
        target.0
    }

    fn traits(&self, target: &EntityId) -> Probe<Traits> {
        Ok(self.get(target)?.traits)
    }

    fn origin(&self, target: &EntityId) -> Probe<Option<Origin>> {
        Ok(self.get(target)?.origin.clone())
    }

    fn member_names(&self, target: &EntityId) -> Probe<Vec<String>> {
        Ok(self
            .get(target)?
            .members
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn submodule_names(&self, target: &EntityId) -> Probe<Vec<String>> {
        Ok(self.get(target)?.submodules.clone())
    }

    fn signature(&self, target: &EntityId) -> Probe<Option<Signature>> {
        Ok(self.get(target)?.signature.clone())
    }

    fn docstring(&self, target: &EntityId) -> Probe<Option<String>> {
        Ok(self.get(target)?.docstring.clone())
    }

    fn source_file(&self, target: &EntityId) -> Probe<Option<String>> {
        Ok(self.get(target)?.source_file.clone())
    }

    fn source_lines(&self, target: &EntityId) -> Probe<Option<(String, LineRange)>> {
        Ok(self.get(target)?.source_lines.clone())
    }

    fn value_repr(&self, target: &EntityId) -> Probe<String> {
        self.get(target)?
            .value
            .clone()
            .ok_or_else(|| RuntimeFault("no value".to_string()))
    }

    fn type_name(&self, target: &EntityId) -> Probe<String> {
        self.get(target)?
            .type_name
            .clone()
            .ok_or_else(|| RuntimeFault("no type".to_string()))
    }

    fn class_facts(&self, target: &EntityId) -> Probe<ClassFacts> {
        Ok(self.get(target)?.class_facts.clone().unwrap_or_default())
    }
}

/// A small `json`-shaped package used across the engine tests
pub fn json_like() -> (MemoryRuntime, EntityId) {
    let mut rt = MemoryRuntime::new();

    let json = rt.package("json");
    rt.entity_mut(json).docstring = Some("JSON (JavaScript Object Notation) encoder and decoder.".into());

    let decoder = rt.module("json.decoder");
    let encoder = rt.module("json.encoder");
    let codecs = rt.module("codecs");
    rt.module("json.tool");

    let dumps = rt.function("json", "dumps");
    {
        let entity = rt.entity_mut(dumps);
        entity.docstring = Some("Serialize ``obj`` to a JSON formatted ``str``.".into());
        entity.signature = Some(Signature {
            parameters: vec![
                crate::core::model::Parameter::new(
                    "obj",
                    crate::core::model::ParameterKind::PositionalOrKeyword,
                ),
                crate::core::model::Parameter::new(
                    "skipkeys",
                    crate::core::model::ParameterKind::KeywordOnly,
                )
                .with_default("False"),
                crate::core::model::Parameter::new(
                    "kw",
                    crate::core::model::ParameterKind::VarKeyword,
                ),
            ],
            return_annotation: None,
        });
    }
    let loads = rt.function("json", "loads");
    rt.entity_mut(loads).docstring = Some("Deserialize ``s`` to a Python object.".into());

    let decode_error = rt.class("json.decoder", "JSONDecodeError");
    rt.bind(decoder, "JSONDecodeError", decode_error);

    let json_encoder = rt.class("json.encoder", "JSONEncoder");
    let encode = rt.function("json.encoder", "JSONEncoder.encode");
    let default = rt.function("json.encoder", "JSONEncoder.default");
    let init = rt.function("json.encoder", "JSONEncoder.__init__");
    let item_separator = rt.constant("', '", "str");
    let object_repr = rt.builtin("object.__repr__");
    rt.bind(json_encoder, "item_separator", item_separator);
    rt.bind(json_encoder, "encode", encode);
    rt.bind(json_encoder, "__init__", init);
    rt.bind(json_encoder, "default", default);
    rt.bind(json_encoder, "__repr__", object_repr);
    rt.bind(encoder, "JSONEncoder", json_encoder);

    let default_encoder = rt.constant("<json.encoder.JSONEncoder object>", "JSONEncoder");
    rt.entity_mut(default_encoder).origin = Some(Origin::new("json.encoder", None));

    rt.bind(json, "codecs", codecs);
    rt.bind(json, "decoder", decoder);
    rt.bind(json, "dumps", dumps);
    rt.bind(json, "encoder", encoder);
    rt.bind(json, "JSONDecodeError", decode_error);
    rt.bind(json, "JSONEncoder", json_encoder);
    rt.bind(json, "loads", loads);
    rt.bind(json, "_default_encoder", default_encoder);

    (rt, json)
}

/// A `random`-shaped module with an exception hierarchy and an enum, covering
/// instance-bound routines, class-level values and inherited compiled members.
///
/// ```text
/// random
///   Random           class, with seed (method), state (property),
///                    fill (async method), with_traceback (inherited)
///   randint          bound to a module-level Random instance
///   shuffle          bound to the same instance
///   fetch            async function
///   TWOPI            value
///   Status           enum-like class with OK, NOT_FOUND (values) and
///                    bit_length, denominator (inherited from int)
///   RandomError      exception with args, with_traceback (inherited) and
///                    retry_after (own descriptor)
/// ```
pub fn random_like() -> (MemoryRuntime, EntityId) {
    let mut rt = MemoryRuntime::new();
    let random = rt.module("random");

    let class = rt.class("random", "Random");
    let seed = rt.function("random", "Random.seed");
    let state = rt.property("random", "Random.state");
    let fill = rt.async_function("random", "Random.fill");
    let traceback = rt.builtin("BaseException.with_traceback");
    rt.bind(class, "seed", seed);
    rt.bind(class, "state", state);
    rt.bind(class, "fill", fill);
    rt.bind(class, "with_traceback", traceback);

    let randint = rt.bound_method("random", "Random.randint");
    let shuffle = rt.bound_method("random", "Random.shuffle");
    let fetch = rt.async_function("random", "fetch");
    let twopi = rt.constant("6.283185307179586", "float");

    let status = rt.class("random", "Status");
    let ok = rt.constant("<Status.OK: 200>", "Status");
    let not_found = rt.constant("<Status.NOT_FOUND: 404>", "Status");
    let bit_length = rt.builtin("int.bit_length");
    let denominator = rt.descriptor("builtins", "int.denominator");
    rt.bind(status, "OK", ok);
    rt.bind(status, "NOT_FOUND", not_found);
    rt.bind(status, "bit_length", bit_length);
    rt.bind(status, "denominator", denominator);

    let error = rt.class("random", "RandomError");
    let args = rt.descriptor("builtins", "BaseException.args");
    let retry_after = rt.descriptor("random", "RandomError.retry_after");
    rt.bind(error, "args", args);
    rt.bind(error, "retry_after", retry_after);
    rt.bind(error, "with_traceback", traceback);

    rt.bind(random, "Random", class);
    rt.bind(random, "randint", randint);
    rt.bind(random, "shuffle", shuffle);
    rt.bind(random, "fetch", fetch);
    rt.bind(random, "TWOPI", twopi);
    rt.bind(random, "Status", status);
    rt.bind(random, "RandomError", error);

    (rt, random)
}
