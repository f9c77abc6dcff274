//! Embedded CPython backend
//!
//! Every probe acquires the GIL, asks the interpreter's own `inspect`,
//! `importlib` and `pkgutil` machinery, and copies the answer out as Rust data.

use pyo3::exceptions::{
    PyAttributeError, PyModuleNotFoundError, PyOSError, PyTypeError, PyValueError,
};
use pyo3::prelude::*;
use std::collections::HashSet;
use std::path::Path;

use super::{
    AccessFailure, ClassFacts, ImportFailure, Origin, Probe, Runtime, RuntimeFault, Traits,
};
use crate::core::model::{LineRange, Parameter, ParameterKind, Signature};

/// Host runtime backed by the embedded Python interpreter
pub struct PythonRuntime {
    _private: (),
}

impl PythonRuntime {
    /// Initialize the interpreter (once per process)
    pub fn new() -> Self {
        pyo3::prepare_freethreaded_python();
        Self { _private: () }
    }

    /// Make units under `dir` importable, ahead of installed packages
    pub fn with_search_path(self, dir: &Path) -> PyResult<Self> {
        Python::with_gil(|py| {
            let path = py.import("sys")?.getattr("path")?;
            path.call_method1("insert", (0, dir.to_string_lossy().into_owned()))?;
            Ok::<(), PyErr>(())
        })?;
        Ok(self)
    }

    fn probe<T>(
        &self,
        target: &PyObject,
        f: impl for<'py> FnOnce(Python<'py>, &'py PyAny) -> PyResult<T>,
    ) -> Probe<T> {
        Python::with_gil(|py| f(py, target.as_ref(py)).map_err(|e| RuntimeFault(e.to_string())))
    }
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for PythonRuntime {
    type Ref = PyObject;

    fn import(&self, dotted: &str) -> Result<PyObject, ImportFailure> {
        Python::with_gil(|py| match py.import(dotted) {
            Ok(module) => Ok(module.into_py(py)),
            Err(err) => {
                if err.is_instance_of::<PyModuleNotFoundError>(py) {
                    let missing = err
                        .value(py)
                        .getattr("name")
                        .ok()
                        .and_then(|name| name.extract::<Option<String>>().ok())
                        .flatten();
                    if let Some(missing) = missing {
                        return Err(ImportFailure::NotFound { missing });
                    }
                }
                Err(ImportFailure::Failed {
                    detail: err.to_string(),
                })
            }
        })
    }

    fn attribute(&self, target: &PyObject, name: &str) -> Result<PyObject, AccessFailure> {
        Python::with_gil(|py| match target.as_ref(py).getattr(name) {
            Ok(value) => Ok(value.into_py(py)),
            Err(err) if err.is_instance_of::<PyAttributeError>(py) => Err(AccessFailure::Missing),
            Err(err) => Err(AccessFailure::Raised {
                detail: err.to_string(),
            }),
        })
    }

    fn identity(&self, target: &PyObject) -> usize {
        target.as_ptr() as usize
    }

    fn traits(&self, target: &PyObject) -> Probe<Traits> {
        self.probe(target, traits_of)
    }

    fn origin(&self, target: &PyObject) -> Probe<Option<Origin>> {
        self.probe(target, origin_of)
    }

    fn member_names(&self, target: &PyObject) -> Probe<Vec<String>> {
        self.probe(target, member_names_of)
    }

    fn submodule_names(&self, target: &PyObject) -> Probe<Vec<String>> {
        self.probe(target, |py, obj| {
            let path = match obj.getattr("__path__") {
                Ok(path) => path,
                Err(_) => return Ok(Vec::new()),
            };
            let mut names = Vec::new();
            for info in py.import("pkgutil")?.call_method1("iter_modules", (path,))?.iter()? {
                names.push(info?.getattr("name")?.extract::<String>()?);
            }
            Ok(names)
        })
    }

    fn signature(&self, target: &PyObject) -> Probe<Option<Signature>> {
        self.probe(target, signature_of)
    }

    fn docstring(&self, target: &PyObject) -> Probe<Option<String>> {
        self.probe(target, |py, obj| {
            py.import("inspect")?
                .call_method1("getdoc", (obj,))?
                .extract::<Option<String>>()
        })
    }

    fn source_file(&self, target: &PyObject) -> Probe<Option<String>> {
        self.probe(target, |py, obj| {
            let inspect = py.import("inspect")?;
            let subject = unwrap_accessor(py, obj)?;

            match inspect.call_method1("getsourcefile", (subject,)) {
                Ok(file) if !file.is_none() => return file.extract::<Option<String>>(),
                Ok(_) => {}
                Err(err) if is_no_source(py, &err) => {}
                Err(err) => return Err(err),
            }

            // Compiled extension modules still report the shared object they came from
            match inspect.call_method1("getfile", (subject,)) {
                Ok(file) => file.extract::<Option<String>>(),
                Err(err) if is_no_source(py, &err) => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn source_lines(&self, target: &PyObject) -> Probe<Option<(String, LineRange)>> {
        self.probe(target, |py, obj| {
            let subject = unwrap_accessor(py, obj)?;
            let found = match py
                .import("inspect")?
                .call_method1("getsourcelines", (subject,))
            {
                Ok(found) => found,
                Err(err) if is_no_source(py, &err) => return Ok(None),
                Err(err) => return Err(err),
            };

            let (lines, start): (Vec<String>, usize) = found.extract()?;
            if lines.is_empty() {
                return Ok(None);
            }
            // Whole modules report line 0
            let start = start.max(1);
            let range = LineRange {
                start,
                end: start + lines.len() - 1,
            };
            Ok(Some((lines.concat(), range)))
        })
    }

    fn value_repr(&self, target: &PyObject) -> Probe<String> {
        self.probe(target, |_, obj| Ok(obj.repr()?.to_str()?.to_string()))
    }

    fn type_name(&self, target: &PyObject) -> Probe<String> {
        self.probe(target, |_, obj| Ok(obj.get_type().name()?.to_string()))
    }

    fn class_facts(&self, target: &PyObject) -> Probe<ClassFacts> {
        self.probe(target, |py, obj| {
            let object = py.import("builtins")?.getattr("object")?;

            let mut bases = Vec::new();
            for base in obj.getattr("__bases__")?.iter()? {
                let base = base?;
                if !base.is(object) {
                    bases.push(base.getattr("__name__")?.extract::<String>()?);
                }
            }

            let mut mro = Vec::new();
            for klass in obj.getattr("__mro__")?.iter()?.skip(1) {
                let klass = klass?;
                if !klass.is(object) {
                    mro.push(klass.getattr("__name__")?.extract::<String>()?);
                }
            }

            let is_abstract = py
                .import("inspect")?
                .call_method1("isabstract", (obj,))?
                .is_true()?;

            Ok(ClassFacts {
                bases,
                mro,
                is_abstract,
            })
        })
    }
}

fn traits_of<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<Traits> {
    let inspect = py.import("inspect")?;
    let check = |predicate: &str| -> PyResult<bool> {
        inspect.call_method1(predicate, (obj,))?.is_true()
    };

    let is_module = check("ismodule")?;
    let is_routine = check("isroutine")?;
    let is_class_attached = is_routine
        && (check("ismethod")? || check("ismethoddescriptor")? || has_owner(obj));

    let property = py.import("builtins")?.getattr("property")?;
    let cached_property = py.import("functools")?.getattr("cached_property")?;
    let kind = obj.get_type();

    Ok(Traits {
        is_module,
        is_package: is_module && obj.hasattr("__path__")?,
        is_class: check("isclass")?,
        is_async: check("iscoroutinefunction")? || check("isasyncgenfunction")?,
        is_routine,
        is_class_attached,
        is_property: obj.is_instance(property)? || obj.is_instance(cached_property)?,
        has_get: kind.hasattr("__get__")?,
        has_set: kind.hasattr("__set__")? || kind.hasattr("__delete__")?,
        is_callable: obj.is_callable(),
    })
}

fn origin_of<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<Option<Origin>> {
    let inspect = py.import("inspect")?;
    let check = |predicate: &str, subject: &PyAny| -> PyResult<bool> {
        inspect.call_method1(predicate, (subject,))?.is_true()
    };

    if check("ismodule", obj)? {
        let name = obj.getattr("__name__")?.extract::<String>()?;
        return Ok(Some(Origin::new(name, None)));
    }

    let subject = unwrap_accessor(py, obj)?;
    if check("isclass", subject)? {
        return Ok(declared_origin(subject));
    }

    // Slot wrappers and method, member and getset descriptors of compiled
    // classes carry no `__module__`; the class that owns them does
    if subject.get_type().hasattr("__get__")? {
        if let Ok(owner) = subject.getattr("__objclass__") {
            return Ok(member_origin(owner, subject));
        }
    }

    if check("isroutine", subject)? {
        let receiver = subject.getattr("__self__").ok().filter(|r| !r.is_none());
        if let Some(receiver) = receiver {
            let declared = optional_str(subject, "__module__").is_some();
            if check("isclass", receiver)? {
                if !declared {
                    return owner_in_mro(receiver, subject);
                }
            } else if check("ismodule", receiver)? {
                if !declared {
                    let qualname = optional_str(subject, "__qualname__");
                    return Ok(optional_str(receiver, "__name__")
                        .map(|module| Origin::new(module, qualname.as_deref())));
                }
            } else {
                // Bound to an instance: the instance's class names the unit
                let module = optional_str(receiver.get_type(), "__module__")
                    .or_else(|| optional_str(subject, "__module__"));
                let qualname = optional_str(subject, "__qualname__");
                return Ok(module.map(|module| Origin::new(module, qualname.as_deref()).on_instance()));
            }
        }
        return Ok(declared_origin(subject));
    }

    // Plain values inherit `__module__` from their type; only their own counts
    Ok(own_module(subject).map(|module| Origin::new(module, None)))
}

fn declared_origin(subject: &PyAny) -> Option<Origin> {
    let qualname = optional_str(subject, "__qualname__");
    optional_str(subject, "__module__").map(|module| Origin::new(module, qualname.as_deref()))
}

fn member_origin(owner: &PyAny, member: &PyAny) -> Option<Origin> {
    let module = optional_str(owner, "__module__")?;
    let qualname = optional_str(member, "__qualname__").or_else(|| {
        let owner_name = optional_str(owner, "__qualname__")?;
        let name = optional_str(member, "__name__")?;
        Some(format!("{}.{}", owner_name, name))
    });
    Some(Origin::new(module, qualname.as_deref()))
}

/// Compiled class methods reached through a subclass name the subclass as
/// their receiver; the declaring class is the first in the MRO that holds them
fn owner_in_mro(receiver: &PyAny, member: &PyAny) -> PyResult<Option<Origin>> {
    let name = match optional_str(member, "__name__") {
        Some(name) => name,
        None => return Ok(None),
    };
    for klass in receiver.getattr("__mro__")?.iter()? {
        let klass = klass?;
        if klass.getattr("__dict__")?.contains(name.as_str())? {
            return Ok(member_origin(klass, member));
        }
    }
    Ok(None)
}

fn own_module(obj: &PyAny) -> Option<String> {
    let namespace = obj.getattr("__dict__").ok()?;
    namespace
        .call_method1("get", ("__module__",))
        .ok()?
        .extract::<String>()
        .ok()
}

fn member_names_of<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut push = |key: &PyAny| {
        if let Ok(name) = key.extract::<String>() {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    };

    // Namespaces keep declaration order; `dir` only adds what they miss
    let namespaces: Vec<&PyAny> = if py.import("inspect")?.call_method1("isclass", (obj,))?.is_true()? {
        obj.getattr("__mro__")?.iter()?.collect::<PyResult<_>>()?
    } else {
        vec![obj]
    };
    for namespace in namespaces {
        if let Ok(dict) = namespace.getattr("__dict__") {
            for key in dict.iter()? {
                push(key?);
            }
        }
    }

    for key in py.import("builtins")?.getattr("dir")?.call1((obj,))?.iter()? {
        push(key?);
    }

    Ok(names)
}

fn signature_of<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<Option<Signature>> {
    let inspect = py.import("inspect")?;
    let sig = match inspect.call_method1("signature", (obj,)) {
        Ok(sig) => sig,
        // No introspectable signature, typical of compiled callables
        Err(err) if err.is_instance_of::<PyValueError>(py) || err.is_instance_of::<PyTypeError>(py) => {
            return Ok(None)
        }
        Err(err) => return Err(err),
    };

    let param_empty = inspect.getattr("Parameter")?.getattr("empty")?;
    let sig_empty = inspect.getattr("Signature")?.getattr("empty")?;
    let annotation_text = |annotation: &PyAny| -> PyResult<Option<String>> {
        if annotation.is(param_empty) || annotation.is(sig_empty) {
            return Ok(None);
        }
        Ok(Some(
            inspect
                .call_method1("formatannotation", (annotation,))?
                .extract::<String>()?,
        ))
    };

    let mut parameters = Vec::new();
    for param in sig.getattr("parameters")?.call_method0("values")?.iter()? {
        let param = param?;
        let kind = match param.getattr("kind")?.getattr("name")?.extract::<String>()?.as_str() {
            "POSITIONAL_ONLY" => ParameterKind::PositionalOnly,
            "VAR_POSITIONAL" => ParameterKind::VarPositional,
            "KEYWORD_ONLY" => ParameterKind::KeywordOnly,
            "VAR_KEYWORD" => ParameterKind::VarKeyword,
            _ => ParameterKind::PositionalOrKeyword,
        };

        let mut parameter = Parameter::new(param.getattr("name")?.extract::<String>()?, kind);
        let default = param.getattr("default")?;
        if !default.is(param_empty) {
            parameter = parameter.with_default(default.repr()?.to_str()?);
        }
        if let Some(annotation) = annotation_text(param.getattr("annotation")?)? {
            parameter = parameter.with_annotation(annotation);
        }
        parameters.push(parameter);
    }

    Ok(Some(Signature {
        parameters,
        return_annotation: annotation_text(sig.getattr("return_annotation")?)?,
    }))
}

/// Properties describe themselves through their getter
fn unwrap_accessor<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let property = py.import("builtins")?.getattr("property")?;
    if obj.is_instance(property)? {
        let getter = obj.getattr("fget")?;
        if !getter.is_none() {
            return Ok(getter);
        }
    }
    let cached_property = py.import("functools")?.getattr("cached_property")?;
    if obj.is_instance(cached_property)? {
        return obj.getattr("func");
    }
    Ok(obj)
}

/// `inspect` signals "no text origin" with these
fn is_no_source(py: Python<'_>, err: &PyErr) -> bool {
    err.is_instance_of::<PyTypeError>(py) || err.is_instance_of::<PyOSError>(py)
}

fn optional_str(obj: &PyAny, attr: &str) -> Option<String> {
    obj.getattr(attr).ok().and_then(|value| value.extract::<String>().ok())
}

/// Declared inside a class: `Owner.name`, but not `func.<locals>.name`
fn has_owner(obj: &PyAny) -> bool {
    optional_str(obj, "__qualname__")
        .and_then(|qualname| {
            qualname
                .rsplit_once('.')
                .map(|(owner, _)| !owner.ends_with("<locals>"))
        })
        .unwrap_or(false)
}
